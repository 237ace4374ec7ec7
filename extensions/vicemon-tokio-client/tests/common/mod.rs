#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use vicemon::command::{
    CheckpointInfo, Command, CommandType, CpuOperation, EmulatorInfo, Memspace, Response,
};
use vicemon::constants::{BROADCAST_REQUEST_ID, FRAME_HEADER_SIZE};
use vicemon::frame::{FrameCodec, RawRequest};
use vicemon_tokio_client::ClientConfig;

/// Binds a simulated monitor to an ephemeral loopback port.
pub async fn bind_monitor() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = ClientConfig::new("127.0.0.1", port)
        .with_connect_timeout(Duration::from_secs(1))
        .with_request_timeout(Duration::from_secs(2));

    (listener, config)
}

/// Reads one request frame; `None` once the client hangs up.
pub async fn read_request(stream: &mut TcpStream) -> Option<RawRequest> {
    let mut header_bytes = [0u8; FRAME_HEADER_SIZE];
    stream.read_exact(&mut header_bytes).await.ok()?;

    let header = FrameCodec::decode_header(&header_bytes).unwrap();
    let mut body = vec![0u8; header.body_length as usize];
    stream.read_exact(&mut body).await.ok()?;

    Some(FrameCodec::decode_request(header, body).unwrap())
}

pub fn reply(request: &RawRequest, body: &[u8]) -> Vec<u8> {
    FrameCodec::encode_response(request.request_id, request.command_type, 0, body)
}

pub fn event(event_type: u8, pc: u16) -> Vec<u8> {
    FrameCodec::encode_response(BROADCAST_REQUEST_ID, event_type, 0, &pc.to_le_bytes())
}

/// Fills a RAM image where every byte holds the low byte of its address.
pub fn patterned_memory() -> Vec<u8> {
    (0..0x10000).map(|addr| addr as u8).collect()
}

/// Two checkpoints the simulated monitor reports when asked for its list.
pub fn sample_checkpoints() -> Vec<CheckpointInfo> {
    [(1, 0x0801), (2, 0xc000)]
        .into_iter()
        .map(|(number, address)| CheckpointInfo {
            number,
            currently_hit: false,
            start: address,
            end: address,
            stop_when_hit: true,
            enabled: true,
            operation: CpuOperation::Exec,
            temporary: false,
            hit_count: number * 3,
            ignore_count: 0,
            has_condition: false,
            memspace: Memspace::MainMemory,
        })
        .collect()
}

/// Answers a request the way a monitor would, against `memory`. May return
/// several frames back to back.
pub fn answer(request: &RawRequest, memory: &mut [u8]) -> Vec<u8> {
    let command = Command::from_request(request).unwrap();

    let body = match command {
        Command::MemoryGet(get) => {
            let data = memory[get.start as usize..=get.end as usize].to_vec();
            Response::Memory(data).encode_body().unwrap()
        }
        Command::MemorySet(set) => {
            let start = set.start as usize;
            memory[start..start + set.data.len()].copy_from_slice(&set.data);
            vec![]
        }
        Command::Info => Response::Info(EmulatorInfo {
            major: 3,
            minor: 9,
            patch: 0,
            version: "3.9".to_string(),
        })
        .encode_body()
        .unwrap(),
        Command::CheckpointList => {
            let (items, end) = Response::encode_checkpoint_list(&sample_checkpoints()).unwrap();
            let mut frames = Vec::new();
            for item in items {
                frames.extend(FrameCodec::encode_response(
                    request.request_id,
                    u8::from(CommandType::CheckpointGet),
                    0,
                    &item,
                ));
            }
            frames.extend(reply(request, &end));
            return frames;
        }
        _ => vec![],
    };

    reply(request, &body)
}

/// Serves every connection with [`answer`], in order, until the client hangs up.
pub fn spawn_monitor(listener: TcpListener) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut memory = patterned_memory();
            while let Some(request) = read_request(&mut stream).await {
                let frame = answer(&request, &mut memory);
                if stream.write_all(&frame).await.is_err() {
                    break;
                }
            }
        }
    })
}

/// A port with nothing listening on it.
pub async fn closed_port_config() -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    ClientConfig::new("127.0.0.1", port).with_connect_timeout(Duration::from_secs(1))
}
