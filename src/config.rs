//! Runtime configuration.

use clap::Parser;

/// Command-line and environment configuration for the oracle server.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "age-oracle",
    about = "Signed age oracle with a local verification chain"
)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "ORACLE_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_port_3000() {
        let cfg = Config::parse_from(["age-oracle"]);
        assert_eq!(cfg.listen, "0.0.0.0:3000");
    }

    #[test]
    fn listen_flag_overrides_default() {
        let cfg = Config::parse_from(["age-oracle", "--listen", "127.0.0.1:8080"]);
        assert_eq!(cfg.listen, "127.0.0.1:8080");
    }
}
