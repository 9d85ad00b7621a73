//! Game file lookup under the games directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions of Z-machine story files and Blorb containers
const STORY_EXTENSIONS: &[&str] = &[
    "z1", "z2", "z3", "z4", "z5", "z6", "z7", "z8", "zblorb", "zlb", "dat",
];

/// Whether `path` looks like a story file the interpreter can load
pub fn is_story_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            STORY_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Story files in `dir`, sorted by name
pub fn list_games(dir: &Path) -> io::Result<Vec<String>> {
    let mut games: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_story_file(path))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    games.sort();
    Ok(games)
}

/// Resolve a game name given on the command line.
///
/// Anything that already points at a file is used as-is; a bare name is
/// looked up in `games_dir`.
pub fn resolve_game(games_dir: &Path, name: &str) -> PathBuf {
    let direct = PathBuf::from(name);
    if direct.is_file() || direct.components().count() > 1 {
        return direct;
    }
    games_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_extensions() {
        assert!(is_story_file(Path::new("zork1.z5")));
        assert!(is_story_file(Path::new("games/Anchorhead.Z8")));
        assert!(is_story_file(Path::new("curses.zblorb")));
        assert!(!is_story_file(Path::new("zork1.z5_log.txt")));
        assert!(!is_story_file(Path::new("README")));
    }

    #[test]
    fn test_list_games_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zork2.z5", "lost.z5", "notes.txt", "zork1.z5_log.txt", "curses.z8"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("saves.z5")).unwrap();

        let games = list_games(dir.path()).unwrap();
        assert_eq!(games, vec!["curses.z8", "lost.z5", "zork2.z5"]);
    }

    #[test]
    fn test_list_games_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_games(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_resolve_game() {
        let games_dir = Path::new("games");
        assert_eq!(resolve_game(games_dir, "zork1.z5"), PathBuf::from("games/zork1.z5"));
        assert_eq!(
            resolve_game(games_dir, "/tmp/other/zork1.z5"),
            PathBuf::from("/tmp/other/zork1.z5")
        );

        let dir = tempfile::tempdir().unwrap();
        let game = dir.path().join("local.z3");
        fs::write(&game, b"").unwrap();
        let name = game.to_string_lossy().into_owned();
        assert_eq!(resolve_game(games_dir, &name), game);
    }
}
