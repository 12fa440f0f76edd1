// Copyright 2026 Linkscout Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity flag.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "linkscout=debug"
    } else {
        "linkscout=info"
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flag. Calling this more
/// than once keeps the first subscriber.
pub fn init(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "linkscout=debug");
        assert_eq!(default_directive(false), "linkscout=info");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false, false);
        init(true, true);
    }
}
