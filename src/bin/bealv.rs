// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Exact verification of logged candidates.
//!
//! The search filter is one-sided: survivors in the result log match some
//! c^z under every filter prime but are almost always coincidences. This
//! tool replays a log and settles each line with big integers: it computes
//! s = a^x + b^y exactly, then tests whether s is a perfect z-th power for
//! any z in [3, maxp] by rounding the z-th root and raising it back.
//!
//! A confirmed line would be a counterexample to Beal's conjecture; expect
//! refutations.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;

use bnum::BUint;

use beal::arith::gcd;

// 4096-bit working width: covers 300^300 (~2470 bits) with headroom.
type Big = BUint<64>;

enum Verdict {
    Power(Big, u32),
    NotAPower,
    TooLarge,
}

fn usage() {
    eprintln!("Usage: bealv --log FILE [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --help       show this help");
    eprintln!("  --log FILE   result log to verify (required)");
    eprintln!("  --maxp N     largest exponent z tested (default 300)");
    eprintln!("  --maxb N     flag witnesses with c above the search bound");
}

fn main() -> ExitCode {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        usage();
        return ExitCode::SUCCESS;
    }
    let Some(log) = arg.get::<String>("log") else {
        usage();
        return ExitCode::FAILURE;
    };
    let maxp = arg.get::<u32>("maxp").unwrap_or(300);
    let maxb = arg.get::<u32>("maxb");

    let file = match File::open(&log) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open {log}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut checked = 0u64;
    let mut confirmed = 0u64;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("read error at line {}: {e}", lineno + 1);
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<u32> = line
            .split_ascii_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        let &[a, x, b, y] = fields.as_slice() else {
            eprintln!("line {}: expected `a x b y`, got {:?}", lineno + 1, line);
            continue;
        };
        if a == 0 || b == 0 || x < 3 || y < 3 {
            eprintln!("line {}: not a valid candidate: {line}", lineno + 1);
            continue;
        }
        checked += 1;
        if gcd(a, b) != 1 {
            println!("{a}^{x} + {b}^{y}: refuted, bases share a factor");
            continue;
        }
        match verify(a, x, b, y, maxp) {
            Verdict::Power(c, z) => {
                confirmed += 1;
                let bound = match maxb {
                    Some(mb) if c > Big::from(mb) => " (witness above search bound)",
                    _ => "",
                };
                println!("{a}^{x} + {b}^{y} = {c}^{z}{bound}");
            }
            Verdict::NotAPower => {
                println!("{a}^{x} + {b}^{y}: refuted, no z-th power for 3 <= z <= {maxp}");
            }
            Verdict::TooLarge => {
                eprintln!("line {}: values exceed the 4096-bit working width", lineno + 1);
            }
        }
    }
    eprintln!("{checked} candidates checked, {confirmed} confirmed");
    ExitCode::SUCCESS
}

fn verify(a: u32, x: u32, b: u32, y: u32, maxp: u32) -> Verdict {
    let Some(ax) = Big::from(a).checked_pow(x) else {
        return Verdict::TooLarge;
    };
    let Some(by) = Big::from(b).checked_pow(y) else {
        return Verdict::TooLarge;
    };
    let Some(s) = ax.checked_add(by) else {
        return Verdict::TooLarge;
    };
    for z in 3..=maxp {
        let r = nth_root(&s, z);
        if r <= Big::ONE {
            // Roots only shrink as z grows; s >= 2 can no longer match.
            break;
        }
        if let Some(p) = r.checked_pow(z) {
            if p == s {
                return Verdict::Power(r, z);
            }
        }
    }
    Verdict::NotAPower
}

// Floor of the z-th root of s, by bisection. The upper bound
// 2^(bits/z + 1) strictly exceeds the root; an overflowing mid^z counts
// as too big.
fn nth_root(s: &Big, z: u32) -> Big {
    let mut lo = Big::ONE;
    let mut hi = Big::ONE << (s.bits() / z + 1) as usize;
    while lo + Big::ONE < hi {
        let mid = (lo + hi) >> 1usize;
        match mid.checked_pow(z) {
            Some(p) if p <= *s => lo = mid,
            _ => hi = mid,
        }
    }
    lo
}
