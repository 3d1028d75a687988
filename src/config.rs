// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;

/// Name of the configuration file in a collection's root directory.
pub const CONFIG_FILE: &str = "flashprep.toml";

const DEFAULT_PORT: u16 = 8000;

#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub drill: DrillConfig,
}

#[derive(Deserialize, PartialEq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct DrillConfig {
    pub port: u16,
    pub open_browser: bool,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            open_browser: true,
        }
    }
}

impl Config {
    /// Load the configuration of the collection at `directory`. A missing
    /// file means the defaults.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE}, using defaults.");
            return Ok(Self::default());
        }
        Self::parse(&read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_missing_file_gives_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.drill.port, 8000);
        assert!(config.drill.open_browser);
        Ok(())
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let dir = tempdir()?;
        write(dir.path().join(CONFIG_FILE), "[drill]\nport = 9123\n")?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.drill.port, 9123);
        assert!(config.drill.open_browser);
        Ok(())
    }

    #[test]
    fn test_empty_file() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::parse("[drill]\nprot = 1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
