use std::{env, fs, net::IpAddr, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration, fixed at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // HTTP surface
    pub bind_addr: IpAddr,
    pub port: u16,
    pub slash_command: String,

    // Slack relay
    pub webhook_url: Option<String>,
    pub relay_min_interval: Duration,

    // Cache / upstream
    pub cache_expiration: Duration,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Load from the process environment (after `.env`) and command-line args.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_lookup(env_str, &args)
    }

    /// Build a config from an arbitrary variable lookup. `--port` in `args`
    /// takes precedence over `PORT`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, args: &[String]) -> Result<Self> {
        let port = match port_from_args(args)? {
            Some(p) => p,
            None => match lookup("PORT").and_then(non_empty) {
                Some(raw) => parse_port(&raw)?,
                None => 8080,
            },
        };

        let bind_addr = match lookup("BIND_ADDR").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|e| Error::Config(format!("BIND_ADDR {raw:?}: {e}")))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let slash_command = lookup("SLASH_COMMAND")
            .and_then(non_empty)
            .unwrap_or_else(|| "/news".to_string());

        let webhook_url = lookup("WEBHOOK_URL").and_then(non_empty);
        if let Some(url) = &webhook_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(
                    "WEBHOOK_URL must be an http(s) URL".to_string(),
                ));
            }
        }

        let cache_expiration =
            Duration::from_secs(parse_u64(&lookup, "CACHE_EXPIRATION_SECS")?.unwrap_or(600));
        if cache_expiration.is_zero() {
            return Err(Error::Config(
                "CACHE_EXPIRATION_SECS must be greater than zero".to_string(),
            ));
        }

        let fetch_timeout =
            Duration::from_millis(parse_u64(&lookup, "FETCH_TIMEOUT_MS")?.unwrap_or(10_000));
        let relay_min_interval =
            Duration::from_millis(parse_u64(&lookup, "RELAY_MIN_INTERVAL_MS")?.unwrap_or(1_000));

        let user_agent = lookup("USER_AGENT")
            .and_then(non_empty)
            .unwrap_or_else(|| "slacker-news/0.1".to_string());

        Ok(Self {
            bind_addr,
            port,
            slash_command,
            webhook_url,
            relay_min_interval,
            cache_expiration,
            fetch_timeout,
            user_agent,
        })
    }

    pub fn relay_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

fn port_from_args(args: &[String]) -> Result<Option<u16>> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_str();
        if let Some(v) = arg
            .strip_prefix("--port=")
            .or_else(|| arg.strip_prefix("-port="))
        {
            return parse_port(v).map(Some);
        }
        if arg == "--port" || arg == "-port" {
            let v = iter
                .next()
                .ok_or_else(|| Error::Config(format!("{arg} requires a value")))?;
            return parse_port(v).map(Some);
        }
    }
    Ok(None)
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| Error::Config(format!("invalid port {raw:?}: {e}")))
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key} {raw:?}: {e}")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_lookup(lookup(&[]), &[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cache_expiration, Duration::from_secs(600));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.slash_command, "/news");
        assert!(!cfg.relay_enabled());
    }

    #[test]
    fn port_flag_wins_over_env() {
        let env = lookup(&[("PORT", "9000")]);
        let cfg = Config::from_lookup(&env, &["--port".to_string(), "7000".to_string()]).unwrap();
        assert_eq!(cfg.port, 7000);
        let cfg = Config::from_lookup(&env, &["-port=7001".to_string()]).unwrap();
        assert_eq!(cfg.port, 7001);
        let cfg = Config::from_lookup(&env, &[]).unwrap();
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn rejects_zero_expiration_and_garbage_numbers() {
        let err = Config::from_lookup(lookup(&[("CACHE_EXPIRATION_SECS", "0")]), &[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup(&[("FETCH_TIMEOUT_MS", "soon")]), &[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = Config::from_lookup(lookup(&[]), &["--port".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn webhook_enables_relay() {
        let cfg = Config::from_lookup(
            lookup(&[("WEBHOOK_URL", "https://hooks.slack.com/services/T/B/x")]),
            &[],
        )
        .unwrap();
        assert!(cfg.relay_enabled());

        let err =
            Config::from_lookup(lookup(&[("WEBHOOK_URL", "hooks.slack.com")]), &[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
