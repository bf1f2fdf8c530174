//! Configuration for the convention engine
//!
//! Reads configuration from:
//! - `.covenant.yaml` / `.covenant.yml` / `.covenant.json` (project-level)
//! - the same names in the home directory (user-level)
//!
//! Besides rule selection, the `conventions` section carries every
//! designated class name the rules compare against, so projects that fork
//! the base test cases can point the rules at their own classes.

use crate::diagnostic::Severity;
use crate::rule::RuleCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Process files in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Rule selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Select rules by prefix (e.g., "easyAdmin." selects every EasyAdmin rule)
    pub extend: Vec<String>,

    /// Ignore rules by prefix
    pub ignore: Vec<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule IDs, or "all")
    pub per_file: HashMap<String, Vec<String>>,
}

/// Allowed `addFlash` types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    pub allowed: Vec<String>,

    /// Value reported with a dedicated message
    pub blocked: String,

    /// Suggested replacement for the blocked value
    pub replacement: String,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            allowed: ["primary", "secondary", "success", "danger", "warning", "info", "light", "dark"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked: "error".to_string(),
            replacement: "danger".to_string(),
        }
    }
}

/// Designated class names the rules check against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionsConfig {
    pub covers_attribute: String,
    pub web_test_case: String,
    pub controller_test_case: String,
    pub menu_test_case: String,
    pub menu_provider_interface: String,
    pub abstract_controller: String,
    pub legacy_controller: String,
    pub crud_controller: String,
    pub controller_bases: Vec<String>,
    pub controller_trait: String,
    pub response_class: String,
    pub admin_action_attribute: String,
    pub admin_crud_attribute: String,
    pub route_attribute: String,
    pub separate_process_attribute: String,
    pub flash: FlashConfig,
}

impl Default for ConventionsConfig {
    fn default() -> Self {
        let abstract_controller = "Symfony\\Bundle\\FrameworkBundle\\Controller\\AbstractController";
        let legacy_controller = "Symfony\\Bundle\\FrameworkBundle\\Controller\\Controller";
        let crud_controller = "EasyCorp\\Bundle\\EasyAdminBundle\\Controller\\AbstractCrudController";

        Self {
            covers_attribute: "PHPUnit\\Framework\\Attributes\\CoversClass".to_string(),
            web_test_case: "Tourze\\PHPUnitSymfonyWebTest\\AbstractWebTestCase".to_string(),
            controller_test_case: "Tourze\\PHPUnitSymfonyWebTest\\AbstractEasyAdminControllerTestCase"
                .to_string(),
            menu_test_case: "Tourze\\PHPUnitSymfonyWebTest\\AbstractEasyAdminMenuTestCase".to_string(),
            menu_provider_interface: "Tourze\\EasyAdminMenuBundle\\Service\\MenuProviderInterface"
                .to_string(),
            abstract_controller: abstract_controller.to_string(),
            legacy_controller: legacy_controller.to_string(),
            crud_controller: crud_controller.to_string(),
            controller_bases: vec![
                abstract_controller.to_string(),
                legacy_controller.to_string(),
                crud_controller.to_string(),
                "EasyCorp\\Bundle\\EasyAdminBundle\\Controller\\AbstractDashboardController".to_string(),
                "Symfony\\Component\\HttpKernel\\Controller\\ControllerInterface".to_string(),
            ],
            controller_trait: "Symfony\\Bundle\\FrameworkBundle\\Controller\\ControllerTrait".to_string(),
            response_class: "Symfony\\Component\\HttpFoundation\\Response".to_string(),
            admin_action_attribute: "EasyCorp\\Bundle\\EasyAdminBundle\\Attribute\\AdminAction".to_string(),
            admin_crud_attribute: "EasyCorp\\Bundle\\EasyAdminBundle\\Attribute\\AdminCrud".to_string(),
            route_attribute: "Symfony\\Component\\Routing\\Attribute\\Route".to_string(),
            separate_process_attribute: "PHPUnit\\Framework\\Attributes\\RunTestsInSeparateProcesses"
                .to_string(),
            flash: FlashConfig::default(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extend from other configuration files or presets
    pub extends: Vec<String>,

    pub engine: EngineConfig,

    pub output: OutputConfig,

    pub rules: RulesConfig,

    pub conventions: ConventionsConfig,

    /// Rule categories to enable (empty = all)
    pub categories: Vec<RuleCategory>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        let categories = match name {
            "recommended" => vec![RuleCategory::Correctness, RuleCategory::Style],
            "strict" => vec![
                RuleCategory::Correctness,
                RuleCategory::Style,
                RuleCategory::Coverage,
            ],
            "minimal" => vec![RuleCategory::Correctness],
            _ => return None,
        };

        Some(Self {
            categories,
            ..Self::default()
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        if !config.extends.is_empty() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            let mut base_config = Self::default();

            for extend in &config.extends.clone() {
                let extended = match Self::preset(extend) {
                    Some(preset) => preset,
                    None => {
                        let extend_path = if Path::new(extend).is_absolute() {
                            PathBuf::from(extend)
                        } else {
                            base_dir.join(extend)
                        };
                        Self::load_with_depth(&extend_path, depth + 1)?
                    }
                };
                base_config.merge(extended);
            }

            base_config.merge(config);
            config = base_config;
        }

        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.extend.extend(other.rules.extend);
        self.rules.ignore.extend(other.rules.ignore);
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }

        // Missing fields were already defaulted at deserialization
        self.conventions = other.conventions;

        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [".covenant.yaml", ".covenant.yml", ".covenant.json"];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Add prefixes to extend (select rules by prefix)
    pub fn add_extend_prefixes(&mut self, prefixes: Vec<String>) {
        self.rules.extend.extend(prefixes);
    }

    /// Add prefixes to ignore
    pub fn add_ignore_prefixes(&mut self, prefixes: Vec<String>) {
        self.rules.ignore.extend(prefixes);
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.rules.disabled.iter().any(|r| r == rule_id) {
            return false;
        }

        if self.matches_ignore_prefix(rule_id) {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|r| r == rule_id);
        }

        self.matches_extend_prefix(rule_id)
    }

    /// Check if a rule category is enabled
    pub fn is_category_enabled(&self, category: RuleCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }

    /// Check if a rule matches any prefix in the extend list
    pub fn matches_extend_prefix(&self, rule_id: &str) -> bool {
        if self.rules.extend.is_empty() {
            return true;
        }
        let rule_upper = rule_id.to_uppercase();
        self.rules
            .extend
            .iter()
            .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()))
    }

    /// Check if a rule matches any prefix in the ignore list
    pub fn matches_ignore_prefix(&self, rule_id: &str) -> bool {
        let rule_upper = rule_id.to_uppercase();
        self.rules
            .ignore
            .iter()
            .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()))
    }

    /// Get severity override for a rule
    pub fn get_severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.severity.get(rule_id).copied()
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        let file_str = file_path.to_string_lossy();

        for (pattern, rules) in &self.rules.per_file {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(file_str.as_ref())
                    && rules.iter().any(|r| r == "all" || r == rule_id)
                {
                    return true;
                }
            }
        }

        false
    }
}
