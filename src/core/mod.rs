//! Gateway core: wire protocol, per-request context, dispatch.

pub mod context;
pub mod gateway;
pub mod protocol;

pub use context::ExecutionContext;
pub use gateway::{DispatchOutcome, Gateway};
pub use protocol::{
    parse_request, ErrorCode, ErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId,
};
