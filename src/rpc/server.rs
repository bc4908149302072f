//! RPC 服务端
//!
//! 每个连接一个线程，连接内逐行处理请求；调用之间不做串行化。
//! 单行请求有长度上限，空闲连接超时后关闭。

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use tracing::{debug, info, warn};

use crate::error::ParamError;
use crate::result::TrialResult;
use crate::service::{ControlService, PortIntrospector, ResultReply, ServiceStatus, StartParams};
use crate::supervisor::ProcessHost;

use super::RpcError;
use super::message::{
    AvailabilityStatus, MacListResult, Request, Response, RunningStatus, Success,
};

/// 服务端看到的控制面
pub trait ControlApi: Send + Sync {
    fn start(&self, params: &StartParams) -> Result<bool, ParamError>;
    fn stop(&self) -> bool;
    fn is_running(&self) -> bool;
    fn is_result_available(&self) -> bool;
    fn status(&self) -> ServiceStatus;
    fn get_result(&self) -> Option<TrialResult>;
    fn get_mac_list(&self) -> Vec<String>;
}

impl<H: ProcessHost, P: PortIntrospector> ControlApi for ControlService<H, P> {
    fn start(&self, params: &StartParams) -> Result<bool, ParamError> {
        ControlService::start(self, params).map(|outcome| outcome.is_success())
    }

    fn stop(&self) -> bool {
        ControlService::stop(self)
    }

    fn is_running(&self) -> bool {
        ControlService::is_running(self)
    }

    fn is_result_available(&self) -> bool {
        ControlService::is_result_available(self)
    }

    fn status(&self) -> ServiceStatus {
        ControlService::status(self)
    }

    fn get_result(&self) -> Option<TrialResult> {
        match ControlService::get_result(self) {
            ResultReply::Available(result) => Some(result),
            ResultReply::Unavailable => None,
        }
    }

    fn get_mac_list(&self) -> Vec<String> {
        ControlService::get_mac_list(self)
    }
}

/// 把一个请求映射到对应的应答
pub fn dispatch(api: &dyn ControlApi, request: Request) -> Response {
    match request {
        Request::Start(params) => match api.start(&params) {
            Ok(success) => Response::Success(Success { success }),
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },
        Request::Stop(_) => Response::Success(Success {
            success: api.stop(),
        }),
        Request::IsRunning(_) => Response::RunningStatus(RunningStatus {
            is_running: api.is_running(),
        }),
        Request::IsResultAvailable(_) => Response::AvailabilityStatus(AvailabilityStatus {
            is_result_available: api.is_result_available(),
        }),
        Request::Status(_) => Response::Status(api.status()),
        Request::GetResult(_) => match api.get_result() {
            Some(result) => Response::TrialResult(result),
            None => Response::ResultUnavailable,
        },
        Request::GetMacList(_) => Response::MacList(MacListResult {
            mac_list: api.get_mac_list(),
        }),
    }
}

/// 单行请求的最大字节数
pub const MAX_REQUEST_LINE: u64 = 64 * 1024;
/// 连接上没有请求到达时的默认断开时间
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// 监听套接字本身失效，继续 accept 没有意义
pub(crate) fn accept_error_is_fatal(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error().map(Errno::from_raw),
        Some(Errno::EBADF | Errno::EINVAL | Errno::ENOTSOCK | Errno::EOPNOTSUPP)
    )
}

/// 资源耗尽类错误，稍等再 accept 以免空转
fn accept_error_needs_backoff(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error().map(Errno::from_raw),
        Some(Errno::EMFILE | Errno::ENFILE | Errno::ENOBUFS | Errno::ENOMEM)
    )
}

pub struct RpcServer {
    listener: TcpListener,
    api: Arc<dyn ControlApi>,
    idle_timeout: Duration,
}

impl RpcServer {
    pub fn bind(addr: &str, api: Arc<dyn ControlApi>) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            api,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.listener.local_addr()?)
    }

    /// 接受连接；单次 accept 失败只记日志，监听套接字失效时才返回
    pub fn serve(self) -> Result<(), RpcError> {
        info!(addr = ?self.listener.local_addr().ok(), "▶️  RPC 服务开始监听");
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) if accept_error_is_fatal(&e) => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "accept 失败，继续监听");
                    if accept_error_needs_backoff(&e) {
                        thread::sleep(ACCEPT_BACKOFF);
                    }
                    continue;
                }
            };
            let api = Arc::clone(&self.api);
            let idle_timeout = self.idle_timeout;
            thread::spawn(move || {
                let peer = stream.peer_addr().ok();
                if let Err(e) = handle_connection(stream, api.as_ref(), idle_timeout) {
                    warn!(?peer, error = %e, "连接处理失败");
                }
            });
        }
        Ok(())
    }
}

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

fn write_response(writer: &mut TcpStream, response: &Response) -> Result<(), RpcError> {
    let mut out = serde_json::to_vec(response)?;
    out.push(b'\n');
    writer.write_all(&out)?;
    writer.flush()?;
    Ok(())
}

fn handle_connection(
    stream: TcpStream,
    api: &dyn ControlApi,
    idle_timeout: Duration,
) -> Result<(), RpcError> {
    stream.set_read_timeout(Some(idle_timeout))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        let n = match (&mut reader).take(MAX_REQUEST_LINE + 1).read_line(&mut line) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                debug!(timeout = ?idle_timeout, "连接空闲超时，关闭");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(());
        }
        if n as u64 > MAX_REQUEST_LINE {
            let response = Response::Error {
                message: format!("request line exceeds {MAX_REQUEST_LINE} bytes"),
            };
            return write_response(&mut writer, &response);
        }
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(method = request.method(), "收到请求");
                dispatch(api, request)
            }
            Err(e) => Response::Error {
                message: format!("invalid request: {e}"),
            },
        };
        write_response(&mut writer, &response)?;
    }
}
