use crate::cmd::{close_camera, open_camera, InfoArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_info, InfoOutput, OutputFormat};

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = open_camera(&args.connect)?;

    let info = client.query_info();
    close_camera(client);
    let info = info.map_err(|err| client_error("info query failed", err))?;

    let out = InfoOutput::new(args.connect.port, info.to_string_lossy().into_owned());
    print_info(&out, format);
    Ok(SUCCESS)
}
