use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use sightcore::processing::Granularity;
use sightcore::record::CategoryKey;
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::profile::GeneratorConfig;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub data_dir: PathBuf,
    pub categories: Vec<CategoryKey>,
    pub default_category: CategoryKey,
    pub granularity: Granularity,
    pub generator: GeneratorConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            categories: vec!["face".into(), "car".into()],
            default_category: CategoryKey::default(),
            granularity: Granularity::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(data_dir: PathBuf, seed: Option<u64>) -> Self {
        let mut config = Self {
            data_dir,
            ..Default::default()
        };
        config.generator.seed = seed;
        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.categories.is_empty() {
            bail!("workflow config lists no categories");
        }
        if !self.knows(&self.default_category) {
            bail!(
                "default category `{}` is not one of the configured categories",
                self.default_category
            );
        }
        Ok(())
    }

    pub fn knows(&self, category: &CategoryKey) -> bool {
        self.categories.contains(category)
    }
}
