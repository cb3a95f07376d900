//! Fuzz target: `ModemLink::on_byte_received`
//!
//! Splits the input into command turns at every `0x00` byte and streams
//! each turn into the link.  A turn must never deliver more than one
//! reply and the captured response must stay within the receive buffer.
//!
//! cargo fuzz run fuzz_modem_link

#![no_main]

use libfuzzer_sys::fuzz_target;
use solmate::app::ports::{ModemPort, ReplyDelegate};
use solmate::modem::buffer::RX_CAPACITY;
use solmate::modem::link::{LinkMode, ModemLink, Reply};

struct Tally(usize);

impl ReplyDelegate for Tally {
    fn on_reply(&mut self, _reply: Reply) {
        self.0 += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let mut link = ModemLink::new();

    for (i, turn) in data.split(|&b| b == 0).enumerate() {
        // Alternate command turns and listening turns.
        if i % 2 == 0 {
            let _ = link.send(b"AT+CMGF=1\r\n");
        } else {
            link.listen();
        }

        let mut tally = Tally(0);
        link.on_bytes_received(turn, &mut tally);

        assert!(tally.0 <= 1, "more than one reply in a turn");
        if tally.0 == 1 {
            assert_eq!(link.mode(), LinkMode::Disarmed);
        }
        assert!(link.response().len() <= RX_CAPACITY);
    }
});
