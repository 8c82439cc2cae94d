//! Predicates over the active mod list.

use crate::context::ExecutionContext;
use crate::diagnostics::LogMessages;
use crate::error::ConfigError;
use crate::registry::{version_at_least, ModRegistry, VersionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModCheckKind {
    /// Passes when `modName` is active; `incompatible` inverts the check.
    IsModLoaded { incompatible: bool },
    /// Passes when `modName` loads before `yourMod`, or the reverse with
    /// `your_mod_first`.
    LoadOrder { your_mod_first: bool },
    /// Passes when the mod's target version is at least `version`.
    IsVersion { version: Option<String> },
    /// Like `IsVersion`, against the version in the mod's ModSync metadata.
    IsModSyncVersion { version: Option<String> },
}

impl ModCheckKind {
    pub fn op_name(&self) -> &'static str {
        match self {
            ModCheckKind::IsModLoaded { .. } => "isModLoaded",
            ModCheckKind::LoadOrder { .. } => "loadOrder",
            ModCheckKind::IsVersion { .. } => "isVersion",
            ModCheckKind::IsModSyncVersion { .. } => "isModSyncVersion",
        }
    }
}

/// A mod-list predicate. The first evaluation is cached for the lifetime of
/// the node and later applications replay it silently.
#[derive(Debug, Clone, PartialEq)]
pub struct ModCheck {
    pub kind: ModCheckKind,
    pub mod_name: Option<String>,
    pub your_mod: Option<String>,
    pub error_on_fail: bool,
    pub messages: LogMessages,
    cached: Option<bool>,
    template_error_reported: bool,
}

impl ModCheck {
    pub fn new(kind: ModCheckKind, mod_name: &str, your_mod: &str) -> Self {
        Self::with_fields(kind, Some(mod_name.to_string()), Some(your_mod.to_string()))
    }

    pub fn with_fields(kind: ModCheckKind, mod_name: Option<String>, your_mod: Option<String>) -> Self {
        Self {
            kind,
            mod_name,
            your_mod,
            error_on_fail: false,
            messages: LogMessages::default(),
            cached: None,
            template_error_reported: false,
        }
    }

    pub fn is_mod_loaded(mod_name: &str, your_mod: &str) -> Self {
        Self::new(ModCheckKind::IsModLoaded { incompatible: false }, mod_name, your_mod)
    }

    pub fn load_order(mod_name: &str, your_mod: &str) -> Self {
        Self::new(ModCheckKind::LoadOrder { your_mod_first: false }, mod_name, your_mod)
    }

    pub fn is_version(mod_name: &str, your_mod: &str, version: &str) -> Self {
        Self::new(
            ModCheckKind::IsVersion {
                version: Some(version.to_string()),
            },
            mod_name,
            your_mod,
        )
    }

    pub fn error_on_fail(mut self, error_on_fail: bool) -> Self {
        self.error_on_fail = error_on_fail;
        self
    }

    pub fn messages(mut self, messages: LogMessages) -> Self {
        self.messages = messages;
        self
    }

    /// The cached result, if the node has been evaluated.
    pub fn cached(&self) -> Option<bool> {
        self.cached
    }

    pub(super) fn apply(&mut self, name: &str, ctx: &mut ExecutionContext<'_>) -> bool {
        if let Some(result) = self.cached {
            return result;
        }
        let registry = ctx.registry();
        let result = match self.evaluate(registry) {
            Ok(passed) => {
                let default = self.default_message(registry);
                self.messages.print(
                    ctx,
                    name,
                    passed,
                    self.error_on_fail,
                    || default,
                    &mut self.template_error_reported,
                );
                passed
            }
            Err(err) => {
                ctx.report_config_error(name, &err);
                false
            }
        };
        self.cached = Some(result);
        result
    }

    fn names(&self) -> Result<(&str, &str), ConfigError> {
        let op = self.kind.op_name();
        let mod_name = self
            .mod_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField { op, field: "modName" })?;
        let your_mod = self
            .your_mod
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingField { op, field: "yourMod" })?;
        Ok((mod_name, your_mod))
    }

    /// Ordered `(first, last)` pair a load-order check enforces.
    fn load_pair<'s>(mod_name: &'s str, your_mod: &'s str, your_mod_first: bool) -> (&'s str, &'s str) {
        if your_mod_first {
            (your_mod, mod_name)
        } else {
            (mod_name, your_mod)
        }
    }

    fn evaluate(&self, registry: &dyn ModRegistry) -> Result<bool, ConfigError> {
        let (mod_name, your_mod) = self.names()?;
        match &self.kind {
            ModCheckKind::IsModLoaded { incompatible } => Ok(registry.is_loaded(mod_name) != *incompatible),
            ModCheckKind::LoadOrder { your_mod_first } => {
                let (first, last) = Self::load_pair(mod_name, your_mod, *your_mod_first);
                Ok(registry.loads_before(first, last))
            }
            ModCheckKind::IsVersion { version } => {
                self.compare(mod_name, version.as_deref(), registry.target_version(mod_name))
            }
            ModCheckKind::IsModSyncVersion { version } => {
                self.compare(mod_name, version.as_deref(), registry.sync_version(mod_name))
            }
        }
    }

    fn compare(&self, mod_name: &str, wanted: Option<&str>, found: Option<&str>) -> Result<bool, ConfigError> {
        let op = self.kind.op_name();
        let wanted = wanted
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingField { op, field: "version" })?;
        let malformed = |version: String| ConfigError::MalformedVersion {
            op,
            version,
            mod_name: mod_name.to_string(),
        };
        let Some(found) = found else {
            return Ok(false);
        };
        version_at_least(found, wanted).map_err(|err| match err {
            VersionError::Malformed(version) => malformed(version),
            VersionError::Shape => ConfigError::VersionShape {
                op,
                wanted: wanted.to_string(),
                found: found.to_string(),
                mod_name: mod_name.to_string(),
            },
        })
    }

    /// Text used on failure with `errorOnFail` and no custom message.
    fn default_message(&self, registry: &dyn ModRegistry) -> Option<String> {
        let (mod_name, your_mod) = self.names().ok()?;
        let missing = || format!("Missing mod: \"{mod_name}\", needed by \"{your_mod}\"");
        let text = match &self.kind {
            ModCheckKind::IsModLoaded { incompatible: true } => {
                format!("Incompatible mods in use: \"{mod_name}\" can't be used with \"{your_mod}\"")
            }
            ModCheckKind::IsModLoaded { incompatible: false } => missing(),
            ModCheckKind::LoadOrder { your_mod_first } => {
                let (first, last) = Self::load_pair(mod_name, your_mod, *your_mod_first);
                format!("Mod load order: \"{first}\" needs to be loaded before \"{last}\"")
            }
            ModCheckKind::IsVersion { version } | ModCheckKind::IsModSyncVersion { version } => {
                let found = match self.kind {
                    ModCheckKind::IsVersion { .. } => registry.target_version(mod_name),
                    _ => registry.sync_version(mod_name),
                };
                let wanted = version.as_deref().unwrap_or_default();
                match found {
                    Some(found) => format!("{your_mod} requires {mod_name} {wanted} but version {found} is used"),
                    None if registry.is_loaded(mod_name) => {
                        format!("{your_mod} requires {mod_name} {wanted} but no version could be read")
                    }
                    None => missing(),
                }
            }
        };
        Some(text)
    }
}
