//! Front-end session with the FRR management daemon.
//!
//! Messages follow the daemon's front-end protocol and are carried in
//! protobuf-marked frames.

use std::io::{Read, Write};

use prost::Message;

use super::frame::{encode_frame, FrameDecoder, MARKER_PROTOBUF};
use super::{Backend, BackendError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DatastoreId {
    DsNone = 0,
    Running = 1,
    Candidate = 2,
    Operational = 3,
    Startup = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum CfgDataReqType {
    ReqTypeNone = 0,
    SetData = 1,
    DeleteData = 2,
}

#[derive(Clone, PartialEq, Message)]
pub struct YangDataValue {
    #[prost(oneof = "yang_data_value::Value", tags = "100")]
    pub value: Option<yang_data_value::Value>,
}

pub mod yang_data_value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Value {
        #[prost(string, tag = "100")]
        EncodedStrVal(String),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct YangData {
    #[prost(string, required, tag = "1")]
    pub xpath: String,
    #[prost(message, optional, tag = "2")]
    pub value: Option<YangDataValue>,
}

#[derive(Clone, PartialEq, Message)]
pub struct YangCfgDataReq {
    #[prost(message, optional, tag = "1")]
    pub data: Option<YangData>,
    #[prost(enumeration = "CfgDataReqType", required, tag = "2")]
    pub req_type: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeRegisterReq {
    #[prost(string, required, tag = "1")]
    pub client_name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeSessionReq {
    #[prost(bool, required, tag = "1")]
    pub create: bool,
    #[prost(oneof = "fe_session_req::Id", tags = "2, 3")]
    pub id: Option<fe_session_req::Id>,
}

pub mod fe_session_req {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Id {
        #[prost(uint64, tag = "2")]
        ClientConnId(u64),
        #[prost(uint64, tag = "3")]
        SessionId(u64),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct FeSessionReply {
    #[prost(bool, required, tag = "1")]
    pub create: bool,
    #[prost(bool, required, tag = "2")]
    pub success: bool,
    #[prost(uint64, optional, tag = "3")]
    pub client_conn_id: Option<u64>,
    #[prost(uint64, required, tag = "4")]
    pub session_id: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeLockDsReq {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(uint64, required, tag = "2")]
    pub req_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "3")]
    pub ds_id: i32,
    #[prost(bool, required, tag = "4")]
    pub lock: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeLockDsReply {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(uint64, required, tag = "2")]
    pub req_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "3")]
    pub ds_id: i32,
    #[prost(bool, required, tag = "4")]
    pub lock: bool,
    #[prost(bool, required, tag = "5")]
    pub success: bool,
    #[prost(string, optional, tag = "6")]
    pub error_if_any: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeSetConfigReq {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "2")]
    pub ds_id: i32,
    #[prost(uint64, required, tag = "3")]
    pub req_id: u64,
    #[prost(message, repeated, tag = "4")]
    pub data: Vec<YangCfgDataReq>,
    #[prost(bool, required, tag = "5")]
    pub implicit_commit: bool,
    #[prost(enumeration = "DatastoreId", required, tag = "6")]
    pub commit_ds_id: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeSetConfigReply {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "2")]
    pub ds_id: i32,
    #[prost(uint64, required, tag = "3")]
    pub req_id: u64,
    #[prost(bool, required, tag = "4")]
    pub success: bool,
    #[prost(bool, required, tag = "5")]
    pub implicit_commit: bool,
    #[prost(string, optional, tag = "6")]
    pub error_if_any: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeCommitConfigReq {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "2")]
    pub src_ds_id: i32,
    #[prost(enumeration = "DatastoreId", required, tag = "3")]
    pub dst_ds_id: i32,
    #[prost(uint64, required, tag = "4")]
    pub req_id: u64,
    #[prost(bool, required, tag = "5")]
    pub validate_only: bool,
    #[prost(bool, required, tag = "6")]
    pub abort: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeCommitConfigReply {
    #[prost(uint64, required, tag = "1")]
    pub session_id: u64,
    #[prost(enumeration = "DatastoreId", required, tag = "2")]
    pub src_ds_id: i32,
    #[prost(enumeration = "DatastoreId", required, tag = "3")]
    pub dst_ds_id: i32,
    #[prost(uint64, required, tag = "4")]
    pub req_id: u64,
    #[prost(bool, required, tag = "5")]
    pub validate_only: bool,
    #[prost(bool, required, tag = "6")]
    pub success: bool,
    #[prost(bool, required, tag = "7")]
    pub abort: bool,
    #[prost(string, optional, tag = "8")]
    pub error_if_any: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FeMessage {
    #[prost(oneof = "fe_message::Message", tags = "2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub message: Option<fe_message::Message>,
}

pub mod fe_message {
    use super::*;

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "2")]
        RegisterReq(FeRegisterReq),
        #[prost(message, tag = "3")]
        SessionReq(FeSessionReq),
        #[prost(message, tag = "4")]
        SessionReply(FeSessionReply),
        #[prost(message, tag = "5")]
        LockdsReq(FeLockDsReq),
        #[prost(message, tag = "6")]
        LockdsReply(FeLockDsReply),
        #[prost(message, tag = "7")]
        SetcfgReq(FeSetConfigReq),
        #[prost(message, tag = "8")]
        SetcfgReply(FeSetConfigReply),
        #[prost(message, tag = "9")]
        CommcfgReq(FeCommitConfigReq),
        #[prost(message, tag = "10")]
        CommcfgReply(FeCommitConfigReply),
    }
}

use fe_message::Message as Fe;

const READ_CHUNK: usize = 4096;

/// A registered front-end session over any byte stream.
pub struct MgmtdClient<S> {
    stream: S,
    decoder: FrameDecoder,
    session_id: u64,
    next_req_id: u64,
}

#[cfg(unix)]
impl MgmtdClient<std::os::unix::net::UnixStream> {
    /// Connect to the daemon's front-end socket and open a session.
    pub fn connect(
        socket: impl AsRef<std::path::Path>,
        client_name: &str,
    ) -> Result<Self, BackendError> {
        let stream = std::os::unix::net::UnixStream::connect(socket.as_ref())?;
        tracing::info!(socket = %socket.as_ref().display(), "connected to mgmtd");
        Self::open(stream, client_name)
    }
}

impl<S: Read + Write> MgmtdClient<S> {
    /// Register as `client_name` and create a session.
    pub fn open(stream: S, client_name: &str) -> Result<Self, BackendError> {
        let mut client = Self {
            stream,
            decoder: FrameDecoder::new(),
            session_id: 0,
            next_req_id: 1,
        };
        client.send(Fe::RegisterReq(FeRegisterReq {
            client_name: client_name.to_string(),
        }))?;
        client.send(Fe::SessionReq(FeSessionReq {
            create: true,
            id: Some(fe_session_req::Id::ClientConnId(0)),
        }))?;
        match client.recv()? {
            Fe::SessionReply(reply) if reply.success => {
                client.session_id = reply.session_id;
                tracing::debug!(session_id = reply.session_id, "mgmtd session created");
                Ok(client)
            }
            Fe::SessionReply(_) => Err(BackendError::Rejected {
                operation: "session".into(),
                message: "session creation failed".into(),
            }),
            _ => Err(unexpected("session")),
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    fn req_id(&mut self) -> u64 {
        let id = self.next_req_id;
        self.next_req_id += 1;
        id
    }

    fn send(&mut self, message: Fe) -> Result<(), BackendError> {
        let payload = FeMessage {
            message: Some(message),
        }
        .encode_to_vec();
        let frame = encode_frame(MARKER_PROTOBUF, &payload)?;
        tracing::debug!(len = frame.len(), "mgmtd frame sent");
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Next protobuf message, reading as much as needed. Native frames are
    /// skipped.
    fn recv(&mut self) -> Result<Fe, BackendError> {
        loop {
            while let Some(frame) = self.decoder.next_frame()? {
                tracing::debug!(
                    len = frame.payload.len(),
                    marker = frame.marker,
                    "mgmtd frame received"
                );
                if frame.marker != MARKER_PROTOBUF {
                    continue;
                }
                if let Some(message) = FeMessage::decode(frame.payload)?.message {
                    return Ok(message);
                }
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(BackendError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            self.decoder.extend(&chunk[..n]);
        }
    }

    fn set_config(&mut self, data: YangCfgDataReq) -> Result<(), BackendError> {
        let req = FeSetConfigReq {
            session_id: self.session_id,
            ds_id: DatastoreId::Candidate as i32,
            req_id: self.req_id(),
            data: vec![data],
            implicit_commit: false,
            commit_ds_id: DatastoreId::Running as i32,
        };
        self.send(Fe::SetcfgReq(req))?;
        match self.recv()? {
            Fe::SetcfgReply(reply) => check("set-config", reply.success, reply.error_if_any),
            _ => Err(unexpected("set-config")),
        }
    }

    fn lock_candidate(&mut self, lock: bool) -> Result<(), BackendError> {
        let req = FeLockDsReq {
            session_id: self.session_id,
            req_id: self.req_id(),
            ds_id: DatastoreId::Candidate as i32,
            lock,
        };
        self.send(Fe::LockdsReq(req))?;
        match self.recv()? {
            Fe::LockdsReply(reply) => check("lock", reply.success, reply.error_if_any),
            _ => Err(unexpected("lock")),
        }
    }
}

impl<S: Read + Write> Backend for MgmtdClient<S> {
    fn lock(&mut self) -> Result<(), BackendError> {
        self.lock_candidate(true)
    }

    fn unlock(&mut self) -> Result<(), BackendError> {
        self.lock_candidate(false)
    }

    fn set(&mut self, xpath: &str, value: Option<&str>) -> Result<(), BackendError> {
        self.set_config(YangCfgDataReq {
            data: Some(YangData {
                xpath: xpath.to_string(),
                value: value.map(|v| YangDataValue {
                    value: Some(yang_data_value::Value::EncodedStrVal(v.to_string())),
                }),
            }),
            req_type: CfgDataReqType::SetData as i32,
        })
    }

    fn delete(&mut self, xpath: &str) -> Result<(), BackendError> {
        self.set_config(YangCfgDataReq {
            data: Some(YangData {
                xpath: xpath.to_string(),
                value: None,
            }),
            req_type: CfgDataReqType::DeleteData as i32,
        })
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        let req = FeCommitConfigReq {
            session_id: self.session_id,
            src_ds_id: DatastoreId::Candidate as i32,
            dst_ds_id: DatastoreId::Running as i32,
            req_id: self.req_id(),
            validate_only: false,
            abort: false,
        };
        self.send(Fe::CommcfgReq(req))?;
        match self.recv()? {
            Fe::CommcfgReply(reply) => check("commit", reply.success, reply.error_if_any),
            _ => Err(unexpected("commit")),
        }
    }
}

fn check(operation: &str, success: bool, error: Option<String>) -> Result<(), BackendError> {
    match (success, error) {
        (true, None) => Ok(()),
        (_, Some(message)) => Err(BackendError::Rejected {
            operation: operation.to_string(),
            message,
        }),
        (false, None) => Err(BackendError::Rejected {
            operation: operation.to_string(),
            message: "no reason given".into(),
        }),
    }
}

fn unexpected(operation: &str) -> BackendError {
    BackendError::UnexpectedReply {
        operation: operation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Replays canned daemon output and captures what the client writes.
    struct Scripted {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Scripted {
        fn new(replies: &[Fe]) -> Self {
            let mut input = Vec::new();
            for reply in replies {
                let payload = FeMessage {
                    message: Some(reply.clone()),
                }
                .encode_to_vec();
                input.extend_from_slice(&encode_frame(MARKER_PROTOBUF, &payload).unwrap());
            }
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }

        fn sent(&self) -> Vec<Fe> {
            let mut decoder = FrameDecoder::new();
            decoder.extend(&self.output);
            decoder
                .drain()
                .unwrap()
                .into_iter()
                .filter_map(|f| FeMessage::decode(f.payload).unwrap().message)
                .collect()
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn session_reply(id: u64) -> Fe {
        Fe::SessionReply(FeSessionReply {
            create: true,
            success: true,
            client_conn_id: Some(0),
            session_id: id,
        })
    }

    fn setcfg_reply(error: Option<&str>) -> Fe {
        Fe::SetcfgReply(FeSetConfigReply {
            session_id: 42,
            ds_id: DatastoreId::Candidate as i32,
            req_id: 1,
            success: error.is_none(),
            implicit_commit: false,
            error_if_any: error.map(String::from),
        })
    }

    #[test]
    fn open_registers_and_reads_session_id() {
        let client = MgmtdClient::open(Scripted::new(&[session_reply(42)]), "vtyang").unwrap();
        assert_eq!(client.session_id(), 42);

        let sent = client.stream.sent();
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], Fe::RegisterReq(r) if r.client_name == "vtyang"));
        assert!(matches!(&sent[1], Fe::SessionReq(r) if r.create));
    }

    #[test]
    fn set_sends_candidate_edit() {
        let stream = Scripted::new(&[session_reply(42), setcfg_reply(None)]);
        let mut client = MgmtdClient::open(stream, "vtyang").unwrap();
        client
            .set(
                "/frr-isisd:isis/instance[area-tag='1'][vrf='default']/description",
                Some("hello"),
            )
            .unwrap();

        let sent = client.stream.sent();
        let Fe::SetcfgReq(req) = &sent[2] else {
            panic!("expected set-config request, got {:?}", sent[2]);
        };
        assert_eq!(req.session_id, 42);
        assert_eq!(req.ds_id, DatastoreId::Candidate as i32);
        assert_eq!(req.data[0].req_type, CfgDataReqType::SetData as i32);
        let data = req.data[0].data.as_ref().unwrap();
        assert!(data.xpath.ends_with("/description"));
        assert_eq!(
            data.value,
            Some(YangDataValue {
                value: Some(yang_data_value::Value::EncodedStrVal("hello".into()))
            })
        );
    }

    #[test]
    fn rejected_reply_is_reported() {
        let stream = Scripted::new(&[session_reply(1), setcfg_reply(Some("bad xpath"))]);
        let mut client = MgmtdClient::open(stream, "vtyang").unwrap();
        let err = client.delete("/nope").unwrap_err();
        assert_eq!(err.to_string(), "set-config rejected: bad xpath");
    }

    #[test]
    fn closed_stream_is_io_error() {
        let err = MgmtdClient::open(Scripted::new(&[]), "vtyang").err().unwrap();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[test]
    fn unexpected_reply_kind() {
        let stream = Scripted::new(&[session_reply(1), session_reply(1)]);
        let mut client = MgmtdClient::open(stream, "vtyang").unwrap();
        assert!(matches!(
            client.commit(),
            Err(BackendError::UnexpectedReply { .. })
        ));
    }
}
