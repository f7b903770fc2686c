use phomemo_m02s::{Printer, SerialTransport};
//
// cargo run --example init
//

fn main() {
    env_logger::init();

    match SerialTransport::open_default() {
        Ok(transport) => {
            let mut printer = Printer::new(transport);
            match printer.initialize().and_then(|_| printer.reset()) {
                Ok(()) => {
                    println!("init success");
                }
                Err(err) => {
                    println!("init failed {:?}", err);
                }
            }
        }
        Err(err) => panic!("could not open port: {}", err),
    }
}
