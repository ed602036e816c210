// Copyright 2023 The beal authors.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Fixed-width modular arithmetic for the residue filter.
//!
//! All filter moduli are 32-bit primes so that residues index a flat bit
//! table. The kernel is deliberately tiny: modular exponentiation and binary
//! GCD on machine words, no allocation, no failure modes.

/// Modular exponentiation `base^exp mod m` by right-to-left binary
/// exponentiation.
///
/// The base is reduced modulo m before the loop. This pre-reduction is
/// required for correctness, not speed: both multiplicands then stay below
/// m < 2^32 and every product fits in 64 bits. Without it `base * base`
/// overflows for bases above 2^32.
pub fn modpow(base: u64, exp: u64, m: u32) -> u32 {
    if m == 1 {
        return 0;
    }
    let m = m as u64;
    let mut result: u64 = 1;
    let mut base = base % m;
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        exp >>= 1;
        base = base * base % m;
    }
    result as u32
}

/// Binary GCD (Stein's algorithm), division-free.
///
/// gcd(0, v) = v, gcd(u, 0) = u, gcd(0, 0) = 0.
pub fn gcd(u: u32, v: u32) -> u32 {
    if u == 0 {
        return v;
    }
    if v == 0 {
        return u;
    }
    let shift = (u | v).trailing_zeros();
    let mut u = u >> u.trailing_zeros();
    let mut v = v;
    loop {
        v >>= v.trailing_zeros();
        if u > v {
            std::mem::swap(&mut u, &mut v);
        }
        v -= u;
        if v == 0 {
            return u << shift;
        }
    }
}

/// Deterministic Miller-Rabin for 32-bit integers.
///
/// The bases {2, 7, 61} decide primality for all n < 2^32. Only used when
/// validating a configuration; never on the search path.
pub fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    for p in [2u32, 3, 5, 7] {
        if n % p == 0 {
            return n == p;
        }
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for a in [2u64, 7, 61] {
        let n64 = n as u64;
        let mut x = modpow(a, d as u64, n) as u64;
        if x == 1 || x == n64 - 1 {
            continue;
        }
        for _ in 1..s {
            x = x * x % n64;
            if x == n64 - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
