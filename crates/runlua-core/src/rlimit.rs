//! Process resource limits, applied before any script code runs.
//!
//! Limits are inherit-by-default; individual limits are tightened with
//! `NAME=VALUE` specs (`nofile=32`). An absolute spec sets both the soft
//! and the hard limit, so a script cannot raise it back.

use tracing::debug;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlimitAction {
    /// Leave whatever the process inherited untouched.
    Inherit,
    /// Set soft and hard limits to the given value.
    Abs(u64),
}

/// One settable limit: its name as accepted on the command line, the
/// platform resource id, and what to do with it.
#[derive(Debug, Clone)]
pub struct RlimitSpec {
    pub name: &'static str,
    resource: libc::c_int,
    pub action: RlimitAction,
}

impl RlimitSpec {
    const fn inherit(name: &'static str, resource: libc::c_int) -> Self {
        Self {
            name,
            resource,
            action: RlimitAction::Inherit,
        }
    }
}

/// The full table of settable limits, all inherited.
pub fn defaults() -> Vec<RlimitSpec> {
    vec![
        RlimitSpec::inherit("CPU", libc::RLIMIT_CPU as libc::c_int),
        RlimitSpec::inherit("FSIZE", libc::RLIMIT_FSIZE as libc::c_int),
        RlimitSpec::inherit("DATA", libc::RLIMIT_DATA as libc::c_int),
        RlimitSpec::inherit("STACK", libc::RLIMIT_STACK as libc::c_int),
        RlimitSpec::inherit("CORE", libc::RLIMIT_CORE as libc::c_int),
        RlimitSpec::inherit("RSS", libc::RLIMIT_RSS as libc::c_int),
        RlimitSpec::inherit("NPROC", libc::RLIMIT_NPROC as libc::c_int),
        RlimitSpec::inherit("NOFILE", libc::RLIMIT_NOFILE as libc::c_int),
        RlimitSpec::inherit("MEMLOCK", libc::RLIMIT_MEMLOCK as libc::c_int),
        RlimitSpec::inherit("AS", libc::RLIMIT_AS as libc::c_int),
        RlimitSpec::inherit("LOCKS", libc::RLIMIT_LOCKS as libc::c_int),
        RlimitSpec::inherit("SIGPENDING", libc::RLIMIT_SIGPENDING as libc::c_int),
        RlimitSpec::inherit("MSGQUEUE", libc::RLIMIT_MSGQUEUE as libc::c_int),
        RlimitSpec::inherit("NICE", libc::RLIMIT_NICE as libc::c_int),
        RlimitSpec::inherit("RTPRIO", libc::RLIMIT_RTPRIO as libc::c_int),
        RlimitSpec::inherit("RTTIME", libc::RLIMIT_RTTIME as libc::c_int),
    ]
}

/// Parse a `NAME=VALUE` spec into the matching table entry. The name is
/// matched case-insensitively; the value must be an unsigned integer.
pub fn parse(specs: &mut [RlimitSpec], arg: &str) -> Result<()> {
    debug!("parsing rlimit spec: {arg}");

    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| Error::RlimitParse(format!("{arg} (expected NAME=VALUE)")))?;

    let spec = specs
        .iter_mut()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::RlimitParse(format!("{arg} (no such limit)")))?;

    let value: u64 = value
        .parse()
        .map_err(|_| Error::RlimitParse(format!("{arg} (value not an unsigned int)")))?;

    spec.action = RlimitAction::Abs(value);
    Ok(())
}

/// Apply every non-inherited spec, in table order.
pub fn apply(specs: &[RlimitSpec]) -> Result<()> {
    for spec in specs {
        let mut rl = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let r = unsafe { libc::getrlimit(spec.resource as _, &mut rl) };
        if r != 0 {
            return Err(Error::RlimitApply {
                name: spec.name,
                source: std::io::Error::last_os_error(),
            });
        }
        debug!(
            "rlimit {}: soft={} hard={}",
            spec.name, rl.rlim_cur, rl.rlim_max
        );

        match spec.action {
            RlimitAction::Inherit => continue,
            RlimitAction::Abs(value) => {
                rl.rlim_cur = value as libc::rlim_t;
                rl.rlim_max = value as libc::rlim_t;
            }
        }

        debug!(
            "set rlimit {}: soft={} hard={}",
            spec.name, rl.rlim_cur, rl.rlim_max
        );
        let r = unsafe { libc::setrlimit(spec.resource as _, &rl) };
        if r != 0 {
            return Err(Error::RlimitApply {
                name: spec.name,
                source: std::io::Error::last_os_error(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_inherit_everything() {
        let specs = defaults();
        assert!(specs
            .iter()
            .all(|spec| spec.action == RlimitAction::Inherit));
    }

    #[test]
    fn parse_sets_an_absolute_limit() {
        let mut specs = defaults();
        parse(&mut specs, "NOFILE=64").unwrap();
        let spec = specs.iter().find(|s| s.name == "NOFILE").unwrap();
        assert_eq!(spec.action, RlimitAction::Abs(64));
    }

    #[test]
    fn parse_is_case_insensitive() {
        let mut specs = defaults();
        parse(&mut specs, "nofile=64").unwrap();
        let spec = specs.iter().find(|s| s.name == "NOFILE").unwrap();
        assert_eq!(spec.action, RlimitAction::Abs(64));
    }

    #[test]
    fn parse_rejects_a_spec_without_a_value() {
        let mut specs = defaults();
        assert!(parse(&mut specs, "NOFILE").is_err());
    }

    #[test]
    fn parse_rejects_an_unknown_limit() {
        let mut specs = defaults();
        assert!(parse(&mut specs, "BOGUS=1").is_err());
    }

    #[test]
    fn parse_rejects_a_non_numeric_value() {
        let mut specs = defaults();
        assert!(parse(&mut specs, "NOFILE=lots").is_err());
    }

    #[test]
    fn apply_accepts_the_current_soft_limit() {
        let mut rl = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let r = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE as _, &mut rl) };
        assert_eq!(r, 0);

        let mut specs = defaults();
        parse(&mut specs, &format!("NOFILE={}", rl.rlim_cur)).unwrap();
        apply(&specs).unwrap();
    }
}
