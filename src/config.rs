// SPDX: CC0-1.0

use crate::Number;
use core::{fmt, str::FromStr};

pub const DELTA_VAR: &str = "TAU_PLANE_DELTA";
pub const MAX_POINTS_VAR: &str = "TAU_PLANE_MAX_POINTS";

/// Process-wide settings, fixed once the engine is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Half-width of the band excluded around the origin.
    pub delta: Number,
    /// Largest accepted grid dimension.
    pub max_points: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delta: 1e-3,
            max_points: 400,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrTyp {
    Unparsable,
    OutOfRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigErr {
    pub typ: ConfigErrTyp,
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { var, value, .. } = self;
        match self.typ {
            ConfigErrTyp::Unparsable => write!(f, "{var}={value:?} is not a number"),
            ConfigErrTyp::OutOfRange => write!(f, "{var}={value:?} is out of range"),
        }
    }
}

impl std::error::Error for ConfigErr {}

impl Config {
    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(delta) = read(&lookup, DELTA_VAR, |d: &Number| d.is_finite() && *d > 0.0)? {
            config.delta = delta;
        }
        if let Some(max) = read(&lookup, MAX_POINTS_VAR, |n: &usize| *n >= 2)? {
            config.max_points = max;
        }
        Ok(config)
    }
}

fn read<F, T, P>(lookup: &F, var: &'static str, valid: P) -> Result<Option<T>, ConfigErr>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    P: Fn(&T) -> bool,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let err = |typ| ConfigErr {
        typ,
        var,
        value: value.clone(),
    };
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| err(ConfigErrTyp::Unparsable))?;
    if valid(&parsed) {
        Ok(Some(parsed))
    } else {
        Err(err(ConfigErrTyp::OutOfRange))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with(vars: &[(&str, &str)]) -> Result<Config, ConfigErr> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(with(&[]), Ok(Config::default()));
        assert_eq!(Config::default().delta, 1e-3);
        assert_eq!(Config::default().max_points, 400);
    }

    #[test]
    fn overrides() {
        let config = with(&[(DELTA_VAR, "0.01"), (MAX_POINTS_VAR, " 50 ")]).unwrap();
        assert_eq!(config.delta, 0.01);
        assert_eq!(config.max_points, 50);
    }

    #[test]
    fn rejects_bad_values() {
        let err = with(&[(DELTA_VAR, "tiny")]).unwrap_err();
        assert_eq!(err.typ, ConfigErrTyp::Unparsable);
        assert_eq!(err.to_string(), "TAU_PLANE_DELTA=\"tiny\" is not a number");

        let err = with(&[(DELTA_VAR, "-1")]).unwrap_err();
        assert_eq!(err.typ, ConfigErrTyp::OutOfRange);

        let err = with(&[(MAX_POINTS_VAR, "1")]).unwrap_err();
        assert_eq!(err.typ, ConfigErrTyp::OutOfRange);
    }
}
