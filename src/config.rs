use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::error::{Error, Result};

/// One layer of optional settings (explicit arguments, environment, or rc file).
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct RcConfig {
    pub(crate) url: Option<String>,
    pub(crate) login: Option<String>,
    pub(crate) probe: Option<String>,
    pub(crate) user: Option<String>,
    pub(crate) verify: Option<bool>,
    pub(crate) timeout: Option<Duration>,
}

impl RcConfig {
    fn from_env() -> Self {
        Self {
            url: std::env::var("NSIDC_URL").ok(),
            login: std::env::var("NSIDC_LOGIN_URL").ok(),
            probe: std::env::var("NSIDC_PROBE_URL").ok(),
            user: std::env::var("NSIDC_USER").ok(),
            ..Self::default()
        }
    }

    fn or(self, fallback: RcConfig) -> RcConfig {
        RcConfig {
            url: self.url.or(fallback.url),
            login: self.login.or(fallback.login),
            probe: self.probe.or(fallback.probe),
            user: self.user.or(fallback.user),
            verify: self.verify.or(fallback.verify),
            timeout: self.timeout.or(fallback.timeout),
        }
    }
}

/// Resolves the client configuration using (in order of precedence):
/// - explicit `url`/`login_url`/`verify` arguments
/// - environment variables `NSIDC_URL`, `NSIDC_LOGIN_URL`, `NSIDC_PROBE_URL`, `NSIDC_USER`
/// - config file from `NSIDC_RC` or `.nsidcrc`
/// - built-in NSIDC / Earthdata defaults
pub(crate) fn load_config(
    url: Option<String>,
    login_url: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let explicit = RcConfig {
        url,
        login: login_url,
        verify,
        ..RcConfig::default()
    };
    let layered = explicit.or(RcConfig::from_env());

    let mut file = RcConfig::default();
    for rc_path in rc_candidates() {
        if rc_path.exists() {
            file = read_rc(&rc_path)?;
            break;
        }
    }

    resolve(layered.or(file))
}

pub(crate) fn resolve(layer: RcConfig) -> Result<ClientConfig> {
    let defaults = ClientConfig::default();
    let cfg = ClientConfig {
        data_url: layer.url.unwrap_or(defaults.data_url),
        login_url: layer.login.unwrap_or(defaults.login_url),
        probe_url: layer.probe.unwrap_or(defaults.probe_url),
        user: layer.user.filter(|u| !u.is_empty()),
        verify: layer.verify.unwrap_or(defaults.verify),
        timeout: layer.timeout.unwrap_or(defaults.timeout),
        ..defaults
    };

    for (name, value) in [
        ("url", &cfg.data_url),
        ("login", &cfg.login_url),
        ("probe", &cfg.probe_url),
    ] {
        if !(value.starts_with("https://") || value.starts_with("http://")) {
            return Err(Error::Config(format!(
                "{} must be an http(s) URL, got '{}'",
                name, value
            )));
        }
    }
    Ok(cfg)
}

pub(crate) fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_rc(&text).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{} ({})", msg, path.display())),
        other => other,
    })
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    // A key with an empty value takes its value from the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || (pk != "verify" && looks_like_url(line)) {
                apply(&mut cfg, pk, strip_quotes(line))?;
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(known_key(k).unwrap_or(""));
            } else {
                apply(&mut cfg, k, v)?;
            }
        }
    }

    Ok(cfg)
}

fn known_key(k: &str) -> Option<&'static str> {
    ["url", "login", "probe", "user", "verify", "timeout"]
        .into_iter()
        .find(|known| *known == k)
}

fn apply(cfg: &mut RcConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => cfg.url = Some(value.to_string()),
        "login" => cfg.login = Some(value.to_string()),
        "probe" => cfg.probe = Some(value.to_string()),
        "user" => cfg.user = Some(value.to_string()),
        "verify" => cfg.verify = Some(!matches!(value, "0" | "false" | "no")),
        "timeout" => {
            let secs = value.parse::<u64>().map_err(|_| {
                Error::Config(format!("timeout must be whole seconds, got '{}'", value))
            })?;
            cfg.timeout = Some(Duration::from_secs(secs));
        }
        _ => {}
    }
    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = strip_quotes(s);
    s.starts_with("https://") || s.starts_with("http://")
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) NSIDC_RC (explicit)
    // 2) ./.nsidcrc
    // 3) ~/.nsidcrc
    if let Ok(p) = std::env::var("NSIDC_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".nsidcrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".nsidcrc"));
    }
    v
}
