//! Addon export.
//!
//! Writes one Lua data file per collection plus the `.toc` manifests the
//! game client needs to load them:
//!
//! ```text
//! <dir>/CovDB/CovDB.toc
//! <dir>/CovDB/db/db_characters_eu_horde.lua
//! <dir>/CovDB_EU_H/CovDB_EU_H.toc
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use covdb_core::covenant::COVENANT_IDS;
use covdb_core::{Collection, Faction};
use covdb_db::models::character::Character;

use crate::error::WorkerError;
use crate::store::CharacterStore;

pub const ADDON_VERSION: &str = "1.1.0";
pub const INTERFACE_VERSION: &str = "90002";

/// Quote `s` as a Lua string literal.
pub fn lua_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "\\{b:03}");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn faction_title(faction: Faction) -> &'static str {
    match faction {
        Faction::Horde => "Horde",
        Faction::Alliance => "Alliance",
    }
}

/// Folder and manifest name of a collection's load-on-demand addon.
pub fn collection_addon_name(collection: Collection) -> String {
    format!(
        "CovDB_{}_{}",
        collection.region.as_str().to_uppercase(),
        collection.faction.letter().to_ascii_uppercase()
    )
}

/// Path of the Lua data file, relative to the export root.
pub fn characters_file(collection: Collection) -> String {
    format!("db/db_{}.lua", collection.table_name())
}

/// Render the Lua data file for `collection`.
///
/// Every realm in `realms` gets a table of four covenant groups, empty when
/// nobody there has chosen. `characters` must only hold characters with a
/// chosen covenant; they are grouped by realm, then by covenant id in
/// `1..=4` order.
pub fn render_characters(
    collection: Collection,
    realms: &[String],
    characters: &[Character],
    date: NaiveDate,
) -> String {
    let mut by_realm: BTreeMap<&str, BTreeMap<i32, Vec<&str>>> = realms
        .iter()
        .map(|realm| (realm.as_str(), BTreeMap::new()))
        .collect();
    for character in characters {
        let Some(covenant) = character.covenant() else {
            continue;
        };
        by_realm
            .entry(character.realm.as_str())
            .or_default()
            .entry(covenant.chosen_covenant_id)
            .or_default()
            .push(character.name.as_str());
    }

    let letter = collection.faction.letter();
    let mut out = String::new();
    let _ = writeln!(out, "--DB Version: {}", date.format("%Y%m%d"));
    out.push_str("local _, ns = ...\n");
    let _ = writeln!(out, "local region = {}", lua_string(collection.region.as_str()));
    out.push_str("local F\n\n");
    out.push_str("local function Load(self, event, ...)\n");
    for (realm, groups) in &by_realm {
        let _ = writeln!(out, "\tF = function() ns.db{letter}[{}]={{", lua_string(realm));
        for id in COVENANT_IDS {
            out.push_str("\t\t{\n");
            for name in groups.get(&id).into_iter().flatten() {
                let _ = writeln!(out, "\t\t\t{},", lua_string(name));
            }
            out.push_str("\t\t},\n");
        }
        out.push_str("\t} end; F()\n");
    }
    out.push_str("end\n");
    out.push_str("local Load_Frame = CreateFrame(\"FRAME\")\n");
    out.push_str("if region == ns.REGION then\n");
    out.push_str("    Load_Frame:RegisterEvent(\"PLAYER_ENTERING_WORLD\")\n");
    out.push_str("    Load_Frame:SetScript(\"OnEvent\", Load)\n");
    out.push_str("end\n");
    out
}

/// Render the `.toc` manifest of a collection's addon.
pub fn render_collection_toc(collection: Collection, date: NaiveDate) -> String {
    let region = collection.region.as_str().to_uppercase();
    let faction = faction_title(collection.faction);
    format!(
        "## Interface: {INTERFACE_VERSION}\n\
         ## Title: CovDB |cffFFFFFFCovenant DB|r ({region} - {faction})\n\
         ## Author: Online\n\
         ## Dependencies: CovDB\n\
         ## Version: {ADDON_VERSION}-{date}\n\
         ## Notes: Covenant Database for {faction} characters in the {region} region\n\
         \n\
         ../CovDB/{file}\n",
        date = date.format("%Y%m%d"),
        file = characters_file(collection),
    )
}

/// Render the main `CovDB.toc` listing every character file.
pub fn render_main_toc() -> String {
    let mut out = format!(
        "## Interface: {INTERFACE_VERSION}\n\
         ## Title: CovDB\n\
         ## Author: Online\n\
         ## Version: {ADDON_VERSION}\n\
         ## Notes: Show Covenant information on tooltips\n\n\
         CovDB.lua\n"
    );
    for collection in Collection::all() {
        out.push_str(&characters_file(collection));
        out.push('\n');
    }
    out
}

async fn write_file(path: &Path, contents: &str) -> Result<(), WorkerError> {
    let wrap = |source| WorkerError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }
    tokio::fs::write(path, contents).await.map_err(wrap)
}

/// What [`export_collection`] wrote.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub collection: Collection,
    pub characters: usize,
    pub realms: usize,
    pub data_file: PathBuf,
}

/// Export one collection's data file and its `.toc` manifest under `dir`.
pub async fn export_collection(
    store: &dyn CharacterStore,
    dir: &Path,
    collection: Collection,
    date: NaiveDate,
) -> Result<ExportReport, WorkerError> {
    let realms = store.list_realms(collection).await?;
    let characters = store.list_with_covenant(collection).await?;

    let data_file = dir.join("CovDB").join(characters_file(collection));
    let lua = render_characters(collection, &realms, &characters, date);
    write_file(&data_file, &lua).await?;

    let addon = collection_addon_name(collection);
    let toc = dir.join(&addon).join(format!("{addon}.toc"));
    write_file(&toc, &render_collection_toc(collection, date)).await?;

    let report = ExportReport {
        collection,
        characters: characters.len(),
        realms: realms.len(),
        data_file,
    };
    tracing::info!(
        %collection,
        characters = report.characters,
        realms = report.realms,
        path = %report.data_file.display(),
        "Collection exported",
    );
    Ok(report)
}

/// Export every collection and rewrite the main manifest.
pub async fn export_all(
    store: &dyn CharacterStore,
    dir: &Path,
    date: NaiveDate,
) -> Result<Vec<ExportReport>, WorkerError> {
    let mut reports = Vec::with_capacity(8);
    for collection in Collection::all() {
        reports.push(export_collection(store, dir, collection, date).await?);
    }
    write_file(&dir.join("CovDB").join("CovDB.toc"), &render_main_toc()).await?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use covdb_core::{Covenant, Region};

    use super::*;
    use crate::store::memory::MemoryStore;

    const US_ALLIANCE: Collection = Collection {
        region: Region::Us,
        faction: Faction::Alliance,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn chosen(id: i32) -> Option<Covenant> {
        Some(Covenant {
            renown_level: 40,
            chosen_covenant_id: id,
        })
    }

    #[test]
    fn lua_string_escapes() {
        assert_eq!(lua_string("Alice"), "\"Alice\"");
        assert_eq!(lua_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(lua_string("x\ny"), "\"x\\ny\"");
        assert_eq!(lua_string("\u{1}"), "\"\\001\"");
        assert_eq!(lua_string("Gérard"), "\"Gérard\"");
    }

    #[test]
    fn addon_names() {
        assert_eq!(collection_addon_name(US_ALLIANCE), "CovDB_US_A");
        assert_eq!(characters_file(US_ALLIANCE), "db/db_characters_us_alliance.lua");
    }

    #[tokio::test]
    async fn renders_groups_in_covenant_order() {
        let store = MemoryStore::new();
        store.put(US_ALLIANCE, "Stormrage", "Zed", None, chosen(3));
        store.put(US_ALLIANCE, "Stormrage", "Amy", None, chosen(1));
        store.put(US_ALLIANCE, "Stormrage", "Bob", None, chosen(3));
        store.put(US_ALLIANCE, "Stormrage", "Nobody", None, chosen(0));
        let realms = store.list_realms(US_ALLIANCE).await.unwrap();
        let characters = store.list_with_covenant(US_ALLIANCE).await.unwrap();

        let lua = render_characters(US_ALLIANCE, &realms, &characters, date());

        let expected_body = "\tF = function() ns.dba[\"Stormrage\"]={\n\
             \t\t{\n\t\t\t\"Amy\",\n\t\t},\n\
             \t\t{\n\t\t},\n\
             \t\t{\n\t\t\t\"Bob\",\n\t\t\t\"Zed\",\n\t\t},\n\
             \t\t{\n\t\t},\n\
             \t} end; F()\n";
        assert!(lua.starts_with("--DB Version: 20260314\nlocal _, ns = ...\nlocal region = \"us\"\n"));
        assert!(lua.contains(expected_body), "{lua}");
        assert!(!lua.contains("Nobody"));
        assert!(lua.ends_with("end\n"));
    }

    #[tokio::test]
    async fn realms_without_choices_get_empty_groups() {
        let store = MemoryStore::new();
        store.put(US_ALLIANCE, "Area 52", "Undecided", None, chosen(0));
        store.put(US_ALLIANCE, "Proudmoore", "Unrefreshed", None, None);
        store.put(US_ALLIANCE, "Stormrage", "Amy", None, chosen(4));
        let realms = store.list_realms(US_ALLIANCE).await.unwrap();
        let characters = store.list_with_covenant(US_ALLIANCE).await.unwrap();

        let lua = render_characters(US_ALLIANCE, &realms, &characters, date());

        let empty = "\t\t{\n\t\t},\n".repeat(4);
        for realm in ["Area 52", "Proudmoore"] {
            let block = format!("\tF = function() ns.dba[\"{realm}\"]={{\n{empty}\t}} end; F()\n");
            assert!(lua.contains(&block), "{lua}");
        }
        assert!(lua.contains("ns.dba[\"Stormrage\"]"));
        let area = lua.find("\"Area 52\"").unwrap();
        let proudmoore = lua.find("\"Proudmoore\"").unwrap();
        let stormrage = lua.find("\"Stormrage\"").unwrap();
        assert!(area < proudmoore && proudmoore < stormrage);
        assert!(!lua.contains("Undecided") && !lua.contains("Unrefreshed"));
    }

    #[test]
    fn collection_toc_points_at_data_file() {
        let toc = render_collection_toc(US_ALLIANCE, date());
        assert!(toc.contains("## Title: CovDB |cffFFFFFFCovenant DB|r (US - Alliance)\n"));
        assert!(toc.contains("## Version: 1.1.0-20260314\n"));
        assert!(toc.ends_with("\n../CovDB/db/db_characters_us_alliance.lua\n"));
    }

    #[test]
    fn main_toc_lists_every_collection() {
        let toc = render_main_toc();
        let files: Vec<&str> = toc.lines().filter(|l| l.starts_with("db/")).collect();
        assert_eq!(files.len(), 8);
        assert!(toc.contains("\nCovDB.lua\n"));
    }

    #[tokio::test]
    async fn export_all_writes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        store.put(US_ALLIANCE, "Stormrage", "Amy", None, chosen(2));
        store.put(US_ALLIANCE, "Proudmoore", "Undecided", None, chosen(0));

        let reports = export_all(&store, dir.path(), date()).await.unwrap();

        assert_eq!(reports.len(), 8);
        let us = reports
            .iter()
            .find(|r| r.collection == US_ALLIANCE)
            .unwrap();
        assert_eq!(us.characters, 1);
        assert_eq!(us.realms, 2);

        let root = dir.path();
        assert!(root.join("CovDB/CovDB.toc").is_file());
        assert!(root.join("CovDB_US_A/CovDB_US_A.toc").is_file());
        assert!(root.join("CovDB_TW_H/CovDB_TW_H.toc").is_file());
        let lua = std::fs::read_to_string(root.join("CovDB/db/db_characters_us_alliance.lua"))
            .unwrap();
        assert!(lua.contains("\"Amy\""));
        assert!(lua.contains("ns.dba[\"Proudmoore\"]"));
    }
}
