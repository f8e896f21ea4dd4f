//! CLI argument definitions and subcommand handlers.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use alertme_node::{AnyNode, MemoryTransport, MessageKind, MessageParams, NodeConfig, NodeRole};
use alertme_protocol::{Command, ReceivedMessage, ALERTME_PROFILE_ID};
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use zigbee_frame::{Address16, Address64, ApiFrame, FrameCodec};

/// AlertMe bridge - build, decode and replay AlertMe radio frames
#[derive(Parser, Debug)]
#[command(name = "alertme")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a message and print it as an escaped TX explicit frame
    #[command(alias = "g")]
    Generate {
        /// Message kind (version_info_update, switch_state_request, ...)
        #[arg(short, long)]
        kind: MessageKind,

        /// Message parameter, repeatable: `state=1`, `type=SmartPlug`
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Node configuration supplying addresses and identity
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Destination long address (default: broadcast)
        #[arg(long)]
        dest: Option<Address64>,

        /// Destination short address (default: fffe)
        #[arg(long)]
        dest_short: Option<Address16>,
    },

    /// Decode hex-encoded frames and print them as JSON
    #[command(alias = "d")]
    Decode {
        /// Hex bytes; several arguments are concatenated
        #[arg(required = true, num_args = 1..)]
        hex: Vec<String>,
    },

    /// Feed frames to a node and print what it sends back
    #[command(alias = "r")]
    Replay {
        /// Node configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Hex bytes; several arguments are concatenated
        #[arg(required = true, num_args = 1..)]
        hex: Vec<String>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_hex(parts: &[String]) -> anyhow::Result<Vec<u8>> {
    let joined: String = parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .map(|part| part.trim_start_matches("0x"))
        .collect();
    hex::decode(&joined).context("invalid hex input")
}

/// `generate`: the escaped frame as lowercase hex.
pub fn generate(
    kind: MessageKind,
    params: &[(String, String)],
    config: Option<&NodeConfig>,
    dest: Option<Address64>,
    dest_short: Option<Address16>,
) -> anyhow::Result<String> {
    let fallback = NodeConfig::new("cli", NodeRole::Device);
    let node = AnyNode::from_config(config.unwrap_or(&fallback));
    let params = MessageParams::from_pairs(params.iter().map(|(k, v)| (k.clone(), v)))?;
    let msg = node.generate_message(kind, &params)?;

    let tx = msg.to_tx_explicit(
        dest.unwrap_or(Address64::BROADCAST),
        dest_short.unwrap_or(Address16::UNKNOWN),
    );
    let bytes = ApiFrame::TxExplicit(tx).encode()?;
    Ok(hex::encode(bytes))
}

/// `decode`: one JSON object per frame found in `bytes`.
pub fn decode(bytes: &[u8]) -> anyhow::Result<serde_json::Value> {
    let mut codec = FrameCodec::new();
    codec.push(bytes);

    let mut frames = Vec::new();
    loop {
        match codec.decode() {
            Ok(Some(frame)) => {
                let entry = match ApiFrame::decode(&frame) {
                    Ok(api) => {
                        let command = match &api {
                            ApiFrame::RxExplicit(rx) => {
                                ReceivedMessage::from(rx.clone()).command()
                            }
                            ApiFrame::TxExplicit(tx) if tx.profile == ALERTME_PROFILE_ID => {
                                Command::decode(tx.cluster, &tx.data)
                            }
                            _ => Ok(None),
                        };
                        match command {
                            Ok(command) => json!({ "frame": api, "command": command }),
                            Err(e) => json!({ "frame": api, "error": e.to_string() }),
                        }
                    }
                    Err(e) => json!({ "frame_type": frame.frame_type, "error": e.to_string() }),
                };
                frames.push(entry);
            }
            Ok(None) => break,
            Err(e) => frames.push(json!({ "error": e.to_string() })),
        }
    }

    if codec.buffered_len() > 0 {
        frames.push(json!({ "error": format!("{} trailing bytes", codec.buffered_len()) }));
    }
    Ok(serde_json::Value::Array(frames))
}

/// How long `replay` waits for the reader thread to work through its input.
const REPLAY_TIMEOUT: Duration = Duration::from_secs(5);

/// `replay`: what the node wrote and, for a hub, its registry.
///
/// The bytes go through the node's own reader thread, exactly as they would
/// arrive from a radio.
pub fn replay(config: &NodeConfig, bytes: &[u8]) -> anyhow::Result<serde_json::Value> {
    // Count the frames the reader will pass on, to know when it is done
    let mut codec = FrameCodec::new();
    codec.push(bytes);
    let mut frames = 0u64;
    let mut discarded = 0u64;
    loop {
        match codec.decode() {
            Ok(Some(_)) => frames += 1,
            Ok(None) => break,
            Err(_) => discarded += 1,
        }
    }

    let node = AnyNode::from_config(config);
    let transport = MemoryTransport::new();
    node.start(transport.clone())?;
    transport.feed(bytes);

    let deadline = Instant::now() + REPLAY_TIMEOUT;
    while transport.pending() > 0 || node.frames_handled() < frames {
        if Instant::now() >= deadline {
            let handled = node.frames_handled();
            node.halt()?;
            bail!("node handled {} of {} frames before timing out", handled, frames);
        }
        thread::sleep(Duration::from_millis(1));
    }
    node.halt()?;

    let mut out = json!({
        "role": node.role(),
        "frames": frames,
        "written": hex::encode(transport.written()),
    });
    if discarded > 0 {
        out["discarded"] = json!(discarded);
    }
    if let Some(devices) = node.list_devices() {
        out["devices"] = serde_json::to_value(devices)?;
    }
    Ok(out)
}

/// Run the parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            kind,
            params,
            config,
            dest,
            dest_short,
        } => {
            let config = config
                .map(|path| NodeConfig::load(&path).with_context(|| format!("loading {}", path.display())))
                .transpose()?;
            println!("{}", generate(kind, &params, config.as_ref(), dest, dest_short)?);
        }
        Commands::Decode { hex } => {
            let bytes = parse_hex(&hex)?;
            if bytes.is_empty() {
                bail!("no input bytes");
            }
            println!("{}", serde_json::to_string_pretty(&decode(&bytes)?)?);
        }
        Commands::Replay { config, hex } => {
            let config = NodeConfig::load(&config)
                .map_err(|e| anyhow!("loading {}: {}", config.display(), e))?;
            let bytes = parse_hex(&hex)?;
            println!("{}", serde_json::to_string_pretty(&replay(&config, &bytes)?)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("state=1").unwrap(),
            ("state".to_string(), "1".to_string())
        );
        assert_eq!(
            parse_param("manu_string=Alert=Me").unwrap(),
            ("manu_string".to_string(), "Alert=Me".to_string())
        );
        assert!(parse_param("state").is_err());
        assert!(parse_param("=1").is_err());
    }

    #[test]
    fn test_parse_hex() {
        let parts = vec!["7e 00".to_string(), "0x05".to_string()];
        assert_eq!(parse_hex(&parts).unwrap(), vec![0x7e, 0x00, 0x05]);
        assert!(parse_hex(&["zz".to_string()]).is_err());
    }

    #[test]
    fn test_generate_switch_request() {
        let dest: Address64 = "00:0d:6f:00:03:bb:b9:f8".parse().unwrap();
        let hex = generate(
            MessageKind::SwitchStateRequest,
            &[("state".to_string(), "0".to_string())],
            None,
            Some(dest),
            Some(Address16([0x88, 0x9f])),
        )
        .unwrap();
        let bytes = hex::decode(hex).unwrap();

        let mut codec = FrameCodec::new();
        codec.push(&bytes);
        let frame = codec.decode().unwrap().unwrap();
        match ApiFrame::decode(&frame).unwrap() {
            ApiFrame::TxExplicit(tx) => {
                assert_eq!(tx.dest_addr_long, dest);
                assert_eq!(tx.cluster, 0x00EE);
                assert_eq!(tx.data, b"\x11\x00\x02\x00\x01");
            }
            other => panic!("Expected TxExplicit, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_missing_parameter() {
        let result = generate(MessageKind::PowerFactorUpdate, &[], None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_reply_frame() {
        let bytes = b"~\x00\x19}1\x00\x00\ro\x00\x03\xbb\xb9\xf8\x88\x9f\x00\x02\x00\xee\xc2\x16\x00\x00\th\x80\x06\x00\x1d";
        let json = decode(bytes).unwrap();
        assert_eq!(json[0]["frame"]["id"], "tx_explicit");
        assert_eq!(json[0]["frame"]["dest_addr_long"], "00:0d:6f:00:03:bb:b9:f8");
        assert_eq!(json[0]["command"]["command"], "switch_state_update");
        assert_eq!(json[0]["command"]["value"], "off");
    }

    #[test]
    fn test_replay_hub_registry() {
        let config = NodeConfig::from_yaml_str("name: hub\nrole: hub\n").unwrap();
        let mut payload = vec![0x00, 0x0d, 0x6f, 0x00, 0x01, 0x72, 0xf7, 0x1b];
        payload.extend_from_slice(&[0x92, 0x54, 0x02, 0x02, 0x00, 0xf6, 0xc2, 0x16, 0x01]);
        payload.extend_from_slice(b"\t\x00\xfeT\x92\x1b\xf7r\x01\x00o\r\x009\x10\x07\x00\x01(\x00\x01\x0bAlertMe.com\tSmartPlug\n2011-07-25");
        let bytes = FrameCodec::encode(0x91, &payload).unwrap();

        let json = replay(&config, &bytes).unwrap();
        assert_eq!(json["role"], "hub");
        assert_eq!(json["frames"], 1);
        assert_eq!(json["written"], "");
        assert!(json.get("discarded").is_none());
        assert_eq!(
            json["devices"]["00:0d:6f:00:01:72:f7:1b"]["type"],
            "SmartPlug"
        );
        assert_eq!(
            json["devices"]["00:0d:6f:00:01:72:f7:1b"]["hwMajorVersion"],
            1
        );
    }

    #[test]
    fn test_replay_plug_answers_through_reader() {
        let config = NodeConfig::from_yaml_str("name: plug\nrole: smartplug\n").unwrap();
        let mut payload = vec![0x00, 0x0d, 0x6f, 0x00, 0x03, 0xbb, 0xb9, 0xf8];
        payload.extend_from_slice(&[0x88, 0x9f, 0x02, 0x02, 0x00, 0xee, 0xc2, 0x16, 0x01]);
        payload.extend_from_slice(b"\x11\x00\x02\x00\x01");
        let request = FrameCodec::encode(0x91, &payload).unwrap();

        // A corrupted copy ahead of the real request is dropped by the reader
        let mut bytes = request.clone();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        bytes.extend_from_slice(&request);

        let json = replay(&config, &bytes).unwrap();
        assert_eq!(json["role"], "smartplug");
        assert_eq!(json["frames"], 1);
        assert_eq!(json["discarded"], 1);
        assert_eq!(
            json["written"],
            hex::encode(b"~\x00\x19}1\x00\x00\ro\x00\x03\xbb\xb9\xf8\x88\x9f\x00\x02\x00\xee\xc2\x16\x00\x00\th\x80\x06\x00\x1d")
        );
        assert!(json.get("devices").is_none());
    }
}
