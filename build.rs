use std::f64::consts::PI;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

// Must match tables::TONE_TABLE_LEN and tables::UNIT_AMPLITUDE_BITS
const TABLE_SIZE: usize = 4096;
const UNIT_AMPLITUDE: f64 = (1u32 << 30) as f64;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if std::env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        // Put the linker script somewhere the linker can find it
        let out = PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
        let memory_x = include_bytes!("memory.x");
        let mut f = File::create(out.join("memory.x")).unwrap();
        f.write_all(memory_x).unwrap();
        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rerun-if-changed=memory.x");
    }

    generate_sine_table();
}

// One period of sin(), scaled so that 1.0 == 1 << 30. Lives in FRAM, the 4k of SRAM can't hold it.
// At this precision one rounding step after the gain multiply matches round(gain * sin + offset) for every 12-bit gain.
fn generate_sine_table() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("sine_table.rs");
    let mut file = File::create(dest_path).unwrap();

    writeln!(file, "pub static SINE_TABLE: [i32; {}] = [", TABLE_SIZE).unwrap();
    for i in 0..TABLE_SIZE {
        let phase = (i as f64 / TABLE_SIZE as f64) * 2.0 * PI;
        let sample = (phase.sin() * UNIT_AMPLITUDE).round() as i32;
        writeln!(file, "    {},", sample).unwrap();
    }
    writeln!(file, "];").unwrap();
}
