//! Features Command
//!
//! Report the probed CPU capability record and the engine each request gets.

use aesforge::{CapabilityRecord, Direction, EngineFactory, Mode, CPU_VARIANT_ENV};

fn flag(on: bool) -> &'static str {
    if on {
        "yes"
    } else {
        "no"
    }
}

/// Print the capability table.
pub fn print_features() {
    let caps = CapabilityRecord::probe();

    println!("CPU features");
    println!("  AES           {}", flag(caps.has_aes()));
    println!("  CLMUL         {}", flag(caps.has_clmul()));
    println!("  VAES          {}", flag(caps.has_vaes()));
    println!("  VPCLMULQDQ    {}", flag(caps.has_vpclmulqdq()));
    println!("  AVX-512 F+BW  {}", flag(caps.has_avx512()));
    println!("  SHA           {}", flag(caps.has_sha()));
    println!("  SHA3          {}", flag(caps.has_sha3()));
    println!("  NEON          {}", flag(caps.has_neon()));
    println!("  Little endian {}", flag(caps.is_little_endian()));
    println!("  Vector width  {} bits", caps.vector_width());

    if let Ok(variant) = std::env::var(CPU_VARIANT_ENV) {
        println!("  ({CPU_VARIANT_ENV}={variant})");
    }

    println!();
    println!("Engines");
    let factory = EngineFactory::with_capabilities(*caps);
    for mode in [Mode::Cbc, Mode::Gcm] {
        for direction in [Direction::Encrypt, Direction::Decrypt] {
            let path = factory.select_path(mode, direction);
            let (mode, direction) = (format!("{mode:?}"), format!("{direction:?}"));
            println!("  {mode:<4} {direction:<8} {}", path.name());
        }
    }
}
