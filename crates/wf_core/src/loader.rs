//! RON data loading from a world root directory.
//!
//! ```text
//! <root>/
//!   world.ron          WorldDefinition (required)
//!   instances/*.ron    WorldInstanceDefinition
//!   templates/*.ron    WorldTemplate
//!   biomes/*.ron       BiomeProfile, merged over the built-ins
//!   archetypes/*.ron   Archetype
//! ```
//!
//! Every directory is optional. Files are read in sorted name order. A
//! malformed file inside a directory is skipped with a warning; a malformed
//! `world.ron` is an error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::archetype::{Archetype, ArchetypeRegistry};
use crate::biome::{BiomeProfile, BiomeRegistry};
use crate::data::{WorldDefinition, WorldInstanceDefinition, WorldTemplate};
use crate::error::{GenError, Result};
use crate::world::WorldBundle;

/// Name of the world file inside a data root.
pub const WORLD_FILE: &str = "world.ron";

/// Loads a [`WorldBundle`] from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldLoader;

impl WorldLoader {
    /// Load everything under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `world.ron` is missing or malformed, or if a data
    /// directory exists but cannot be listed.
    pub fn load(root: impl AsRef<Path>) -> Result<WorldBundle> {
        let root = root.as_ref();
        let world: WorldDefinition = load_file(&root.join(WORLD_FILE))?;

        let instances: Vec<WorldInstanceDefinition> = load_dir(&root.join("instances"))?;
        let templates: Vec<WorldTemplate> = load_dir(&root.join("templates"))?;

        let mut biomes = BiomeRegistry::with_builtins();
        for profile in load_dir::<BiomeProfile>(&root.join("biomes"))? {
            biomes.insert(profile);
        }

        let mut archetypes = ArchetypeRegistry::new();
        for archetype in load_dir::<Archetype>(&root.join("archetypes"))? {
            archetypes.insert(archetype);
        }

        tracing::info!(
            root = %root.display(),
            world = %world.name,
            regions = world.regions.len(),
            instances = instances.len(),
            templates = templates.len(),
            archetypes = archetypes.len(),
            "Loaded world data"
        );

        Ok(WorldBundle {
            world,
            instances,
            templates,
            biomes,
            archetypes,
        })
    }
}

/// Read and parse one RON file.
///
/// # Errors
///
/// Returns [`GenError::Io`] or [`GenError::DataParseError`].
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| GenError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    ron::from_str(&content).map_err(|e| GenError::DataParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parse every `.ron` file in `dir`, in sorted file-name order. A missing
/// directory yields nothing.
///
/// # Errors
///
/// Returns [`GenError::Io`] if the directory exists but cannot be read.
pub fn load_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let io_err = |e: std::io::Error| GenError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    };
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|e| e == "ron") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_file(path) {
            Ok(item) => loaded.push(item),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping data file"),
        }
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ArchetypeSource;

    const WORLD: &str = r#"WorldDefinition(
        name: "vale",
        seed: 5,
        start: StartPoint(region: "meadow", anchor: "shrine"),
        regions: [
            RegionDefinition(
                id: "meadow",
                biome: "moor",
                time_budget_minutes: 5,
                anchors: [AnchorDefinition(id: "shrine", kind: Shrine)],
            ),
        ],
    )"#;

    const MOOR: &str = r#"BiomeProfile(
        id: "moor",
        base_ground: "heather",
        edge: EdgeTreatment(kind: "peat_bank", depth: 2),
    )"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_full_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, WORLD_FILE, WORLD);
        write(root, "biomes/moor.ron", MOOR);
        write(
            root,
            "archetypes/inn.ron",
            r#"Archetype(id: "service:inn", layers: ["walls"])"#,
        );
        write(
            root,
            "templates/cellar.ron",
            r#"WorldTemplate(
                id: "cellar",
                kind: Dungeon,
                width: 20,
                height: 20,
                entry: (x: 1, y: 1),
            )"#,
        );
        write(
            root,
            "instances/b_cellar.ron",
            r#"WorldInstanceDefinition(id: "cellar_b", template: "cellar")"#,
        );
        write(
            root,
            "instances/a_cellar.ron",
            r#"WorldInstanceDefinition(id: "cellar_a", template: "cellar")"#,
        );

        let bundle = WorldLoader::load(root).unwrap();
        assert_eq!(bundle.world.name, "vale");
        assert!(bundle.biomes.contains("moor"));
        assert!(bundle.biomes.contains("forest"));
        assert!(bundle.archetypes.load("service:inn").is_ok());
        assert_eq!(bundle.templates.len(), 1);
        let ids: Vec<_> = bundle.instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["cellar_a", "cellar_b"]);
        assert!(bundle.check().is_ok());
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, WORLD_FILE, WORLD);
        write(root, "biomes/moor.ron", MOOR);
        write(root, "biomes/broken.ron", "BiomeProfile(id: ");
        write(root, "biomes/notes.txt", "not ron");

        let bundle = WorldLoader::load(root).unwrap();
        assert!(bundle.biomes.contains("moor"));
    }

    #[test]
    fn test_missing_world_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WorldLoader::load(dir.path()),
            Err(GenError::Io { .. })
        ));

        write(dir.path(), WORLD_FILE, "WorldDefinition(");
        assert!(matches!(
            WorldLoader::load(dir.path()),
            Err(GenError::DataParseError { .. })
        ));
    }
}
