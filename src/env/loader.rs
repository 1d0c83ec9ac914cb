use std::{fs, io::Cursor, path::Path};

use anyhow::{Context, Result};

use crate::env::EnvMap;

/// Merges the variables of a dotenv file into `env`, later keys winning.
/// Returns the number of variables read.
pub fn load_env_file(path: &Path, env: &mut EnvMap) -> Result<usize> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;

    let mut count = 0;
    for item in dotenvy::from_read_iter(Cursor::new(content)) {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
        count += 1;
    }

    tracing::debug!(path = %path.display(), count, "loaded env file");
    Ok(count)
}
