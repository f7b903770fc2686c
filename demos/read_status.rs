use phomemo_m02s::{Printer, RfcommTransport};
//
// cargo run --example read_status -- 04:7F:0E:AA:BB:CC
//

fn main() {
    env_logger::init();

    let mac = std::env::args().nth(1).unwrap_or_else(|| {
        println!("usage: read_status <bluetooth-address>");
        std::process::exit(2);
    });

    match RfcommTransport::connect_default(&mac) {
        Ok(transport) => {
            let mut printer = Printer::new(transport);
            match printer.initialize() {
                Ok(()) => {
                    println!("serial number: {:?}", printer.serial_number());
                    println!("firmware:      {:?}", printer.firmware_version());
                    println!("paper state:   {:?}", printer.paper_state());
                    println!("energy:        {:?}", printer.energy());
                    println!("device timer:  {:?}", printer.device_timer());
                }
                Err(err) => println!("Error {:?}", err),
            }
        }
        Err(err) => panic!("could not connect: {}", err),
    }
}
