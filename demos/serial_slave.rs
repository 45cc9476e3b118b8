use std::{
    env,
    io::{self, Read, Write},
    time::Duration,
};

use oneway::{
    ByteSink, ByteSource, MemoryStore, Receiver, ReceiverConfig, Reception, Switch,
};
use serialport::SerialPort;

struct SerialSource {
    port: Box<dyn SerialPort>,
}

impl ByteSource for SerialSource {
    fn next_byte(&mut self, blocking: bool) -> Option<u8> {
        let mut buf = [0u8; 1];
        loop {
            match self.port.read(&mut buf) {
                Ok(1) => return Some(buf[0]),
                Ok(_) => {}
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                    if !blocking {
                        return None;
                    }
                }
                Err(e) => {
                    eprintln!("{}", e);
                    return None;
                }
            }
        }
    }
}

struct Console;

impl ByteSink for Console {
    fn emit_byte(&mut self, byte: u8) {
        let _ = io::stdout().write_all(&[byte]);
    }
}

fn confirm(address: u16) -> bool {
    print!("\nset local address to {:04X}? [y/N] ", address);
    let _ = io::stdout().flush();

    let mut answer = String::new();
    io::stdin().read_line(&mut answer).is_ok() && answer.trim().eq_ignore_ascii_case("y")
}

fn main() {
    let path = env::args().nth(1).expect("no serial port supplied");
    let address = env::args()
        .nth(2)
        .map(|arg| u16::from_str_radix(&arg, 16).expect("address must be hex"));

    let port = serialport::new(path, 9_600)
        .timeout(Duration::from_millis(20))
        .open()
        .expect("failed to open serial port");

    let mut receiver = Receiver::new(
        SerialSource { port },
        Console,
        MemoryStore::new(),
        ReceiverConfig::default(),
    );

    if let Some(address) = address {
        match receiver.change_address(address, confirm) {
            Ok(local) => println!("listening as {:04X}", local.get()),
            Err(err) => eprintln!("{err}"),
        }
    }

    while let Some(reception) = receiver.poll(true) {
        match reception {
            Reception::Actuate(actuation) => {
                let state = match actuation.switch() {
                    Some(Switch::On) => "on",
                    Some(Switch::Off) => "off",
                    None => "?",
                };
                println!("\nlines {:?} -> {}", actuation.pin_mask.lines(), state);
            }
            Reception::NotAddressed { address } => println!("\nframe for {:04X}", address),
            Reception::Rejected(err) => eprintln!("\n{err}"),
        }
    }

    println!("{:?}", receiver.stats());
}
