use std::fmt;
use std::path::{Path, PathBuf};

/// Which of the three benchmark stages a file or report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    KeyGeneration,
    SaveEncounter,
    QueryEncounter,
}

impl Stage {
    pub fn title(self) -> &'static str {
        match self {
            Stage::KeyGeneration => "Key Generation",
            Stage::SaveEncounter => "Save Encounter",
            Stage::QueryEncounter => "Query Encounter",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Stage::KeyGeneration => "keygen",
            Stage::SaveEncounter => "save",
            Stage::QueryEncounter => "query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The leading `_`-delimited token of an input file name, e.g. `500` for
/// `500_encounters.json`.
pub fn transaction_label(input_filename: &str) -> &str {
    let name = Path::new(input_filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(input_filename);
    name.split('_').next().unwrap_or(name)
}

/// Where a run reads its fixtures from and writes its results to.
///
/// Every name is parameterised by policy size, attribute count and the
/// transaction-count label so runs with different shapes never collide.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub policy_size: u32,
    pub num_attributes: u32,
    pub input_filename: String,
    pub label: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl RunLayout {
    pub fn new(
        policy_size: u32,
        num_attributes: u32,
        input_filename: &str,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            policy_size,
            num_attributes,
            label: transaction_label(input_filename).to_string(),
            input_filename: input_filename.to_string(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.input_dir.join(&self.input_filename)
    }

    pub fn users_path(&self) -> PathBuf {
        self.input_dir.join(format!(
            "users_{}_{}_{}.json",
            self.policy_size, self.num_attributes, self.label
        ))
    }

    pub fn encounter_ids_path(&self) -> PathBuf {
        self.input_dir.join(format!(
            "{}_encounter_ids_{}_{}.json",
            self.label, self.policy_size, self.num_attributes
        ))
    }

    pub fn queried_encounters_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}_encounters_{}_{}.json",
            self.label, self.policy_size, self.num_attributes
        ))
    }

    pub fn summary_path(&self, stage: Stage) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}_{}_transaction_summary.txt",
            self.policy_size,
            self.num_attributes,
            self.label,
            stage.suffix()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_first_underscore_token() {
        assert_eq!(transaction_label("500_encounters.json"), "500");
        assert_eq!(transaction_label("1000_users_4.json"), "1000");
        assert_eq!(transaction_label("plain.json"), "plain.json");
        assert_eq!(transaction_label("sub/dir/20_x.json"), "20");
    }

    #[test]
    fn file_names_follow_run_shape() {
        let layout = RunLayout::new(4, 8, "250_encounters.json", "input", "data");
        assert_eq!(layout.input_path(), Path::new("input/250_encounters.json"));
        assert_eq!(layout.users_path(), Path::new("input/users_4_8_250.json"));
        assert_eq!(layout.encounter_ids_path(), Path::new("input/250_encounter_ids_4_8.json"));
        assert_eq!(
            layout.summary_path(Stage::SaveEncounter),
            Path::new("data/4_8_250_save_transaction_summary.txt")
        );
        assert_eq!(
            layout.summary_path(Stage::QueryEncounter),
            Path::new("data/4_8_250_query_transaction_summary.txt")
        );
        assert_eq!(
            layout.summary_path(Stage::KeyGeneration),
            Path::new("data/4_8_250_keygen_transaction_summary.txt")
        );
    }
}
