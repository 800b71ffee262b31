//! kexhold command line interface.
//!
//! Resolves the target, then runs the probe engine against each candidate
//! address in turn, stopping at the first one that accepts at least one
//! connection. Exits 0 on normal completion — including a target that
//! refused everything — and 1 on usage errors, resolution failures, or a
//! fatal poller failure.

use std::net::{SocketAddr, ToSocketAddrs};
use std::process;

use clap::Parser;
use kexhold_platform::{KexholdError, KexholdResult};
use kexhold_proto::ssh::engine::{Engine, ProbeConfig, DEFAULT_MAX_CONCURRENCY};
use tracing::info;

/// Default target port (the ssh service).
const DEFAULT_PORT: u16 = 22;

/// Hold open concurrent pre-authentication SSH sessions against a target host
#[derive(Parser)]
#[command(name = "kexhold")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Maximum number of simultaneous connections
    #[arg(short, long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    connections: usize,

    /// Target host, with an optional numeric port (default 22)
    target: String,
}

/// Splits `host[:port]`, leaving bare IPv6 literals and `[host]:port`
/// bracket forms intact.
fn split_target(target: &str) -> (&str, Option<&str>) {
    if let Some(rest) = target.strip_prefix('[') {
        if let Some((host, after)) = rest.split_once(']') {
            return (host, after.strip_prefix(':'));
        }
    }
    match target.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => (host, Some(port)),
        _ => (target, None),
    }
}

/// Resolves the target to its candidate socket addresses.
fn resolve(target: &str) -> KexholdResult<Vec<SocketAddr>> {
    let (host, port) = split_target(target);
    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| KexholdError::Config(format!("invalid port in '{}'", target)))?,
        None => DEFAULT_PORT,
    };
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| KexholdError::Config(format!("cannot resolve '{}': {}", target, e)))?
        .collect();
    if addrs.is_empty() {
        return Err(KexholdError::Config(format!(
            "no addresses found for '{}'",
            target
        )));
    }
    Ok(addrs)
}

fn run(cli: &Cli) -> KexholdResult<()> {
    let addrs = resolve(&cli.target)?;
    let config = ProbeConfig::new().with_max_concurrency(cli.connections);
    let mut engine = Engine::new(config)?;

    for addr in addrs {
        info!("probing {}", addr);
        let opened = engine.run(addr)?;
        info!("opened {} connections to {}", opened, addr);
        if opened > 0 {
            break;
        }
    }
    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("kexhold: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_target_plain_host() {
        assert_eq!(split_target("example.com"), ("example.com", None));
    }

    #[test]
    fn test_split_target_host_and_port() {
        assert_eq!(split_target("example.com:2222"), ("example.com", Some("2222")));
    }

    #[test]
    fn test_split_target_bare_ipv6() {
        assert_eq!(split_target("::1"), ("::1", None));
    }

    #[test]
    fn test_split_target_bracketed_ipv6() {
        assert_eq!(split_target("[::1]"), ("::1", None));
        assert_eq!(split_target("[::1]:2222"), ("::1", Some("2222")));
    }

    #[test]
    fn test_resolve_loopback() {
        let addrs = resolve("127.0.0.1:2222").unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:2222".parse().unwrap()]);
    }

    #[test]
    fn test_resolve_default_port() {
        let addrs = resolve("127.0.0.1").unwrap();
        assert_eq!(addrs[0].port(), DEFAULT_PORT);
    }

    #[test]
    fn test_resolve_bad_port_is_config_error() {
        assert!(matches!(
            resolve("example.com:ssh"),
            Err(KexholdError::Config(_))
        ));
        assert!(matches!(
            resolve("example.com:"),
            Err(KexholdError::Config(_))
        ));
    }
}
