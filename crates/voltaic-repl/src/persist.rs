//! Saving and loading circuits as replayable command files.
//!
//! The on-disk format is one shell command per line, exactly the successful
//! mutating commands of the session. Loading replays them through the normal
//! dispatcher, which reproduces the element list and index maps.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Write the command history to a file, one command per line.
pub fn save(path: &Path, history: &[String]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    for line in history {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Read a saved command file back as lines.
pub fn load(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(|line| line.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_round_trip() {
        let history = vec![
            "add R R1 IN OUT 1k".to_string(),
            "addsource V V1 IN GND 10".to_string(),
        ];
        let path = env::temp_dir().join("voltaic_persist_round_trip.ckt");

        save(&path, &history).unwrap();
        let loaded = load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(history, loaded);
    }
}
