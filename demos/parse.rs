//! Reassembles a raw PES byte stream read from stdin.
//!
//! The input is a concatenation of PES packets (as written by e.g. a demultiplexer dumping a
//! single PID). It is fed to the reassembler in chunks of `--chunk-size` bytes; the bytes left
//! over by a completed packet start the next one. Unbounded packets extend to the end of input.
extern crate clap;
extern crate mpeg2ts_pes;
#[macro_use]
extern crate trackable;

use clap::{App, Arg};
use mpeg2ts_pes::pes::{ElementaryStreamUnit, UnitOptions};
use mpeg2ts_pes::Pid;
use std::io::{Read, Write};
use trackable::error::{Failed, Failure};

fn main() {
    let matches = App::new("parse")
        .arg(
            Arg::with_name("OUTPUT_TYPE")
                .long("output-type")
                .short("o")
                .takes_value(true)
                .possible_values(&["pes-packet", "es-audio", "es-video", "header"])
                .default_value("pes-packet"),
        )
        .arg(
            Arg::with_name("CHUNK_SIZE")
                .long("chunk-size")
                .short("c")
                .takes_value(true)
                .default_value("184"),
        )
        .get_matches();
    let output_type = matches.value_of("OUTPUT_TYPE").unwrap();
    let chunk_size = track_try_unwrap!(parse_chunk_size(matches.value_of("CHUNK_SIZE").unwrap()));

    let mut input = Vec::new();
    track_try_unwrap!(std::io::stdin()
        .read_to_end(&mut input)
        .map_err(Failure::from_error));

    let pid = track_try_unwrap!(Pid::new(0x100));
    let options = UnitOptions::from_env();
    let mut seen: Vec<u8> = Vec::new();
    let mut unit = ElementaryStreamUnit::with_options(pid, options.clone());
    for chunk in input.chunks(chunk_size) {
        let mut rest = chunk;
        while !rest.is_empty() {
            let consumed = track_try_unwrap!(unit.append(rest));
            rest = &rest[consumed..];
            if unit.is_completed() {
                handle_unit(&unit, output_type, &mut seen);
                unit = ElementaryStreamUnit::with_options(pid, options.clone());
            }
        }
    }
    if unit.buffered_len() > 0 {
        track_try_unwrap!(unit.finalize());
        handle_unit(&unit, output_type, &mut seen);
    }
}

fn parse_chunk_size(value: &str) -> Result<usize, Failure> {
    let chunk_size = track!(value.parse::<usize>().map_err(Failure::from_error))?;
    track_assert!(chunk_size > 0, Failed, "--chunk-size must be positive");
    Ok(chunk_size)
}

fn handle_unit(unit: &ElementaryStreamUnit, output_type: &str, seen: &mut Vec<u8>) {
    let stream_id = unit.stream_id().expect("never fails");
    let payload = unit.payload().expect("never fails");
    match output_type {
        "pes-packet" => {
            println!(
                "{:?} {:?} pts={:?} dts={:?} {} bytes",
                unit.header(),
                unit.optional_header(),
                unit.pts().map(|t| t.as_u64()),
                unit.dts().map(|t| t.as_u64()),
                payload.len()
            );
        }
        "es-audio" => {
            if stream_id.is_audio() {
                track_try_unwrap!(std::io::stdout()
                    .write_all(payload)
                    .map_err(Failure::from_error));
            }
        }
        "es-video" => {
            if stream_id.is_video() {
                track_try_unwrap!(std::io::stdout()
                    .write_all(payload)
                    .map_err(Failure::from_error));
            }
        }
        "header" => {
            let id = stream_id.as_u8();
            if !seen.contains(&id) {
                seen.push(id);
                println!("0x{:0X?}", id);
            }
        }
        _ => unreachable!(),
    }
}
