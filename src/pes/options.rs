use std::env;

const TS_IGNORE_HEADER_LENGTH: &str = "TS_IGNORE_HEADER_LENGTH";
const TS_ALLOW_MISSING_TIMESTAMPS: &str = "TS_ALLOW_MISSING_TIMESTAMPS";

/// Options controlling how an `ElementaryStreamUnit` interprets its input.
///
/// The default is the strict behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOptions {
    /// Ignore `packet_len` and treat every unit as unbounded.
    ///
    /// Units are then only completed by `ElementaryStreamUnit::finalize`.
    pub ignore_packet_len: bool,

    /// Accept units whose PTS/DTS flags are `00` instead of failing on them.
    pub allow_missing_timestamps: bool,
}
impl UnitOptions {
    /// Reads the options from the `TS_IGNORE_HEADER_LENGTH` and
    /// `TS_ALLOW_MISSING_TIMESTAMPS` environment variables.
    ///
    /// An option is enabled when its variable is `true` (case insensitive).
    pub fn from_env() -> Self {
        UnitOptions {
            ignore_packet_len: env_flag(TS_IGNORE_HEADER_LENGTH),
            allow_missing_timestamps: env_flag(TS_ALLOW_MISSING_TIMESTAMPS),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .unwrap_or_else(|_| "false".into())
        .to_lowercase()
        == "true"
}

#[cfg(test)]
mod test {
    use super::*;

    // The only test touching these variables, so it cannot race with another one.
    #[test]
    fn from_env() {
        env::set_var(TS_IGNORE_HEADER_LENGTH, "TRUE");
        env::set_var(TS_ALLOW_MISSING_TIMESTAMPS, "false");
        let options = UnitOptions::from_env();
        env::remove_var(TS_IGNORE_HEADER_LENGTH);
        env::remove_var(TS_ALLOW_MISSING_TIMESTAMPS);

        assert_eq!(
            options,
            UnitOptions {
                ignore_packet_len: true,
                allow_missing_timestamps: false,
            }
        );
        assert_eq!(UnitOptions::from_env(), UnitOptions::default());
    }
}
