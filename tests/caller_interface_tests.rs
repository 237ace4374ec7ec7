use std::sync::Mutex;
use vicemon::command::{
    CheckpointInfo, CheckpointSet, Command, CommandType, DisplayBuffer, DisplayFormat, ErrorCode,
    Memspace, RegisterValue, Response,
};
use vicemon::frame::{FrameCodec, FrameHeader, RawResponse};
use vicemon::{MonitorCallerInterface, MonitorError, ValidationError};

/// A caller that answers from a small in-memory 64 KiB RAM image and records
/// every command it was handed.
struct MockMonitor {
    memory: Mutex<Vec<u8>>,
    calls: Mutex<Vec<Command>>,
}

impl MockMonitor {
    fn checkpoint(number: u32, set: &CheckpointSet) -> CheckpointInfo {
        CheckpointInfo {
            number,
            currently_hit: false,
            start: set.start,
            end: set.end,
            stop_when_hit: set.stop_when_hit,
            enabled: set.enabled,
            operation: set.operation,
            temporary: set.temporary,
            hit_count: 0,
            ignore_count: 0,
            has_condition: false,
            memspace: set.memspace,
        }
    }

    fn new() -> Self {
        Self {
            memory: Mutex::new(vec![0; 0x10000]),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn reply(command: &Command, status: u8, body: Vec<u8>) -> RawResponse {
        RawResponse {
            header: FrameHeader {
                version: 0x02,
                body_length: body.len() as u32,
                request_id: 1,
                kind: command.expected_response_type(),
                status,
            },
            body,
            items: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl MonitorCallerInterface for MockMonitor {
    async fn call(&self, command: Command) -> Result<RawResponse, MonitorError> {
        // Exercise the real request encoder, as a transport would.
        let frame = command.encode_frame(1)?;
        assert_eq!(frame[10], u8::from(command.command_type()));

        self.calls.lock().unwrap().push(command.clone());

        let body = match &command {
            Command::MemoryGet(get) => {
                let memory = self.memory.lock().unwrap();
                let data = memory[get.start as usize..=get.end as usize].to_vec();
                Response::Memory(data).encode_body().unwrap()
            }
            Command::MemorySet(set) => {
                let mut memory = self.memory.lock().unwrap();
                let start = set.start as usize;
                memory[start..start + set.data.len()].copy_from_slice(&set.data);
                vec![]
            }
            Command::Reset(_) => {
                return Ok(Self::reply(&command, u8::from(ErrorCode::InvalidParameter), vec![]));
            }
            Command::RegistersSet { values, .. } => {
                Response::Registers(values.clone()).encode_body().unwrap()
            }
            Command::CheckpointSet(set) => Response::Checkpoint(Self::checkpoint(1, set))
                .encode_body()
                .unwrap(),
            Command::CheckpointList => {
                let list = vec![Self::checkpoint(1, &CheckpointSet::breakpoint(0xa000, 0xa000))];
                let (items, end) = Response::encode_checkpoint_list(&list).unwrap();
                let mut raw = Self::reply(&command, 0, end);
                raw.items = items
                    .into_iter()
                    .map(|body| Self::reply(&Command::CheckpointGet { number: 1 }, 0, body))
                    .collect();
                return Ok(raw);
            }
            Command::DisplayGet { .. } => Response::Display(DisplayBuffer {
                debug_width: 4,
                debug_height: 2,
                debug_offset_x: 1,
                debug_offset_y: 0,
                inner_width: 2,
                inner_height: 2,
                bits_per_pixel: 8,
                pixels: vec![0, 1, 2, 3, 4, 5, 6, 7],
            })
            .encode_body()
            .unwrap(),
            _ => vec![],
        };

        Ok(Self::reply(&command, 0, body))
    }
}

#[tokio::test]
async fn write_then_read_memory() {
    let monitor = MockMonitor::new();

    monitor
        .write_memory(0xc000, vec![0xa9, 0x01, 0x60], Memspace::MainMemory, 0)
        .await
        .unwrap();

    let data = monitor
        .read_memory(0xbfff, 0xc003, Memspace::MainMemory, 0, false)
        .await
        .unwrap();

    assert_eq!(data, vec![0x00, 0xa9, 0x01, 0x60, 0x00]);
}

#[tokio::test]
async fn ping_succeeds_with_empty_body() {
    let monitor = MockMonitor::new();
    monitor.ping().await.unwrap();

    assert_eq!(*monitor.calls.lock().unwrap(), vec![Command::Ping]);
}

#[tokio::test]
async fn invalid_ranges_never_reach_the_transport() {
    let monitor = MockMonitor::new();

    let result = monitor
        .read_memory(0x2000, 0x1000, Memspace::MainMemory, 0, false)
        .await;
    assert!(matches!(
        result,
        Err(MonitorError::Validation(ValidationError::InvalidRange(_)))
    ));

    let result = monitor
        .write_memory(0x1000, vec![], Memspace::MainMemory, 0)
        .await;
    assert!(matches!(
        result,
        Err(MonitorError::Validation(ValidationError::InvalidRange(_)))
    ));

    assert!(monitor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remote_status_surfaces_as_remote_error() {
    let monitor = MockMonitor::new();

    assert_eq!(
        monitor.reset(Default::default()).await,
        Err(MonitorError::Remote {
            command: CommandType::Reset,
            code: ErrorCode::InvalidParameter
        })
    );
}

#[tokio::test]
async fn decoded_calls_return_typed_responses() {
    let monitor = MockMonitor::new();

    let response = monitor.call_decoded(Command::ExecuteUntilReturn).await.unwrap();
    assert_eq!(response, Response::Empty);

    // The frame the mock built is a well-formed request.
    let frame = Command::ExecuteUntilReturn.encode_frame(1).unwrap();
    let header = FrameCodec::decode_header(frame[..12].try_into().unwrap()).unwrap();
    assert_eq!(header.body_length, 5);
}

#[tokio::test]
async fn register_writes_report_the_resulting_registers() {
    let monitor = MockMonitor::new();
    let values = vec![RegisterValue { id: 0, value: 0x42 }];

    let registers = monitor
        .set_registers(Memspace::MainMemory, values.clone())
        .await
        .unwrap();

    assert_eq!(registers, values);
}

#[tokio::test]
async fn checkpoints_are_set_listed_toggled_and_deleted() {
    let monitor = MockMonitor::new();

    let info = monitor
        .checkpoint_set(CheckpointSet::breakpoint(0xc000, 0xc010))
        .await
        .unwrap();
    assert_eq!((info.number, info.start, info.end), (1, 0xc000, 0xc010));

    let list = monitor.checkpoint_list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].start, 0xa000);

    monitor.checkpoint_toggle(1, false).await.unwrap();
    monitor.checkpoint_delete(1).await.unwrap();

    // A backwards range is refused before it reaches the transport.
    assert!(matches!(
        monitor
            .checkpoint_set(CheckpointSet::breakpoint(0x2000, 0x1000))
            .await,
        Err(MonitorError::Validation(ValidationError::InvalidRange(_)))
    ));

    let calls = monitor.calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    assert_eq!(
        calls[2],
        Command::CheckpointToggle {
            number: 1,
            enabled: false
        }
    );
}

#[tokio::test]
async fn display_capture_returns_pixels() {
    let monitor = MockMonitor::new();

    let display = monitor
        .display_get(true, DisplayFormat::Indexed8)
        .await
        .unwrap();

    assert_eq!((display.inner_width, display.inner_height), (2, 2));
    assert_eq!(display.pixels.len(), 8);
}
