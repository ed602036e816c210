use brunch::Bench;

use beal::arith::{gcd, modpow};
use beal::cztable::CzTable;
use beal::points::PointCursor;
use beal::search::Searcher;
use beal::SearchConfig;

brunch::benches! {
    Bench::new("modpow 64-bit base").run_seeded(
        (4542062976100348463_u64, 4637193517411546665_u64, 3773338459_u32),
        |(b, e, m)| modpow(b, e, m),
    ),
    Bench::new("gcd u32").run_seeded((3528626340_u32, 2865418380_u32), |(u, v)| gcd(u, v)),
    Bench::new("cursor shard a=299").run_seeded((), |_| PointCursor::new(300, 30, 299).count()),
    {
        let t = CzTable::build(300, 300, 4294967291).unwrap();
        Bench::new("filter probe").run_seeded((299_u32, 17_u32, &t), |(c, z, t)| {
            let m = t.modulus() as u64;
            let mut r = t.value(c, z) as u64 + t.value(7, 31) as u64;
            if r >= m {
                r -= m;
            }
            t.contains(r as u32)
        })
    },
    {
        let searcher = Searcher::new(&SearchConfig {
            max_base: 100,
            max_pow: 30,
            primes: vec![4294967291],
        })
        .unwrap();
        Bench::new("search shard a=97")
            .with_samples(10)
            .run_seeded(&searcher, |s| s.search(97).len())
    },
}
