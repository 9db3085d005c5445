//! Document server command.

use console::style;

use crate::config::Settings;

const DEFAULT_PORT: u16 = 4000;

/// Start the document server.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;
    let addr = format!("{}:{}", host, port);

    println!(
        "{} Starting docfields server on {}",
        style("→").cyan(),
        addr
    );
    println!("  Database: {}", style(settings.database_url()).dim());
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "4000" -> 127.0.0.1:4000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:4000
/// - Host and port: "0.0.0.0:4000" -> 0.0.0.0:4000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("4100").unwrap(),
            ("127.0.0.1".to_string(), 4100)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 4000)
        );
        assert_eq!(
            parse_bind_address("192.168.1.5:4001").unwrap(),
            ("192.168.1.5".to_string(), 4001)
        );
        assert!(parse_bind_address("").is_err());
    }
}
