use std::{
    error::Error,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lzss_rs::header::{decompress_gba, GbaHeader};
use lzss_rs::*;

/// Decode an LZSS file
#[derive(Parser, Debug)]
struct Args {
    input: PathBuf,
    output: PathBuf,

    /// Byte order of reference codes (msb or lsb)
    #[arg(long, default_value = "msb")]
    order: Order,

    /// Which end of a reference code holds the length (high or low)
    #[arg(long, default_value = "high")]
    split: FieldSplit,

    #[arg(long, default_value_t = 12)]
    offset_bits: u32,

    #[arg(long, default_value_t = 4)]
    length_bits: u32,

    /// Minimum match length; the smallest legal value if omitted
    #[arg(long)]
    threshold: Option<usize>,

    /// Input starts with a GBA BIOS header (implies the default layout)
    #[arg(long)]
    gba_header: bool,

    /// Decode incrementally instead of loading the whole input
    #[arg(long)]
    stream: bool,

    /// Read size used with --stream
    #[arg(long, default_value_t = 64 * 1024)]
    chunk_size: usize,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Write decoded bytes, keeping partial output if decoding failed
fn write_result(
    outp: &mut impl Write,
    res: Result<Vec<u8>, DecodeFailure>,
) -> Result<usize, Box<dyn Error>> {
    match res {
        Ok(data) => {
            outp.write_all(&data)?;
            Ok(data.len())
        }
        Err(failure) => {
            outp.write_all(&failure.output)?;
            outp.flush()?;
            Err(failure.into())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut builder = DecoderBuilder::new(args.order)
        .split(args.split)
        .offset_bits(args.offset_bits)
        .length_bits(args.length_bits);
    if let Some(threshold) = args.threshold {
        builder = builder.threshold(threshold);
    }
    let decoder = builder.build()?;

    let mut outp_f = BufWriter::new(File::create(&args.output)?);

    let written = if args.gba_header {
        let inp = std::fs::read(&args.input)?;
        let (hdr, _) = GbaHeader::parse(&inp)?;
        info!(declared = hdr.decoded_len, "gba header");
        write_result(&mut outp_f, decompress_gba(&inp))?
    } else if args.stream {
        let mut reader = decoder.reader(File::open(&args.input)?);
        let mut buf = vec![0u8; args.chunk_size.max(1)];
        let mut total = 0;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            outp_f.write_all(&buf[..n])?;
            total += n;
        }
        info!(consumed = reader.bytes_consumed(), "input done");
        reader.close();
        total
    } else {
        let inp = std::fs::read(&args.input)?;
        write_result(&mut outp_f, decoder.decode(&inp))?
    };

    outp_f.flush()?;
    info!(written, output = %args.output.display(), "decoded");

    Ok(())
}
