use phomemo_m02s::{Alignment, PrintConfig, Printer, RfcommTransport};
//
// cargo run --example print_image -- 04:7F:0E:AA:BB:CC photo.png
//

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let (mac, path) = match (args.next(), args.next()) {
        (Some(mac), Some(path)) => (mac, path),
        _ => {
            println!("usage: print_image <bluetooth-address> <image>");
            std::process::exit(2);
        }
    };

    let image = image::open(&path).expect("could not open image");

    let config = PrintConfig::new().width(512).padding_top(5);

    match RfcommTransport::connect_default(&mac) {
        Ok(transport) => {
            let mut printer = Printer::new(transport);
            let result = printer
                .initialize()
                .and_then(|_| printer.align(Alignment::Center))
                .and_then(|_| printer.print_image(&image, &config))
                .and_then(|_| printer.reset());
            match result {
                Ok(()) => println!("printed {}", path),
                Err(err) => println!("print failed {:?}", err),
            }
        }
        Err(err) => panic!("could not connect: {}", err),
    }
}
