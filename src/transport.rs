use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;

/// Datagram or stream semantics for the syslog connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketMode {
    /// UDP; delivery is not guaranteed and sends may silently drop.
    #[default]
    Udp,
    /// TCP; each line is terminated with a newline frame delimiter.
    Tcp,
}

/// Connection to a syslog daemon, opened once by the owning emitter.
///
/// No retries and no timeouts at this layer: a blocking stream write
/// blocks the calling thread, and errors propagate to the caller. The
/// stream handle sits behind a mutex so a shared emitter can send from
/// multiple threads.
#[derive(Debug)]
pub struct SyslogTransport {
    socket: Socket,
}

#[derive(Debug)]
enum Socket {
    Udp(UdpSocket),
    Tcp(Mutex<TcpStream>),
}

impl SyslogTransport {
    pub fn connect<A: ToSocketAddrs>(addr: A, mode: SocketMode) -> io::Result<Self> {
        let socket = match mode {
            SocketMode::Udp => {
                let socket = UdpSocket::bind(("0.0.0.0", 0))?;
                socket.connect(addr)?;
                Socket::Udp(socket)
            }
            SocketMode::Tcp => Socket::Tcp(Mutex::new(TcpStream::connect(addr)?)),
        };
        Ok(SyslogTransport { socket })
    }

    /// Send one wire line.
    pub fn send(&self, line: &[u8]) -> io::Result<()> {
        match &self.socket {
            Socket::Udp(socket) => {
                socket.send(line)?;
                Ok(())
            }
            Socket::Tcp(stream) => {
                let mut stream = stream
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                stream.write_all(line)?;
                if line.last() != Some(&b'\n') {
                    stream.write_all(b"\n")?;
                }
                stream.flush()
            }
        }
    }
}
