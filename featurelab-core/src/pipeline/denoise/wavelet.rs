//! Multilevel discrete wavelet transform with periodic extension.
//!
//! Denoising keeps only the coarsest approximation band: every detail band is
//! zeroed before reconstruction. Odd-length stages are extended by repeating
//! the last sample and truncated again on the way back, so the output always
//! has the input length. Level 0 is the identity.
//!
//! Orthogonal families (`haar`, `db1`..`db4`, `sym2`..`sym8`) use tabulated
//! scaling filters. The spline biorthogonal families (`biorN.M`, `rbioN.M` for
//! N = 1, 2, 3) are generated from the Cohen-Daubechies-Feauveau construction.

use super::DenoiseError;
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

const DB2: [f64; 4] = [
    0.482_962_913_144_534_1,
    0.836_516_303_737_807_9,
    0.224_143_868_042_013_4,
    -0.129_409_522_551_260_4,
];

const DB3: [f64; 6] = [
    0.332_670_552_950_082_6,
    0.806_891_509_311_092_5,
    0.459_877_502_118_491_5,
    -0.135_011_020_010_254_6,
    -0.085_441_273_882_026_7,
    0.035_226_291_885_709_5,
];

const DB4: [f64; 8] = [
    0.230_377_813_308_896_4,
    0.714_846_570_552_915_4,
    0.630_880_767_929_858_7,
    -0.027_983_769_416_859_9,
    -0.187_034_811_719_093_1,
    0.030_841_381_835_560_7,
    0.032_883_011_666_885_2,
    -0.010_597_401_785_069_0,
];

const SYM4: [f64; 8] = [
    0.032_223_100_604_051_5,
    -0.012_603_967_262_031_3,
    -0.099_219_543_576_633_5,
    0.297_857_795_605_306_1,
    0.803_738_751_805_132_2,
    0.497_618_667_632_775_0,
    -0.029_635_527_646_002_5,
    -0.075_765_714_789_502_3,
];

const SYM5: [f64; 10] = [
    0.019_538_882_735_249_9,
    -0.021_101_834_024_689_0,
    -0.175_328_089_908_056_3,
    0.016_602_105_764_510_5,
    0.633_978_963_456_792_1,
    0.723_407_690_404_041_0,
    0.199_397_533_976_855_7,
    -0.039_134_249_302_313_8,
    0.029_519_490_925_706_3,
    0.027_333_068_344_998_8,
];

const SYM6: [f64; 12] = [
    0.015_404_109_327_044_8,
    0.003_490_712_084_222_2,
    -0.117_990_111_148_520_1,
    -0.048_311_742_585_698_2,
    0.491_055_941_927_973_7,
    0.787_641_141_028_651_5,
    0.337_929_421_728_165_8,
    -0.072_637_522_786_376_6,
    -0.021_060_292_512_370_9,
    0.044_724_901_770_781_4,
    0.001_767_711_864_254_0,
    -0.007_800_708_325_032_4,
];

const SYM7: [f64; 14] = [
    0.002_291_833_954_053_8,
    -0.003_283_297_847_466_8,
    -0.018_126_605_131_338_4,
    0.020_464_207_577_546_0,
    0.044_742_349_468_352_4,
    -0.101_010_920_868_420_2,
    -0.056_804_476_889_666_2,
    0.483_610_915_682_267_8,
    0.781_921_593_291_727_8,
    0.360_218_460_906_259_8,
    -0.064_131_289_807_385_8,
    -0.064_908_003_547_188_5,
    0.017_213_376_300_804_5,
    0.012_015_419_283_549_2,
];

const SYM8: [f64; 16] = [
    0.001_889_950_332_767_7,
    -0.000_302_920_514_724_1,
    -0.014_952_258_337_062_2,
    0.003_808_752_013_894_5,
    0.049_137_179_673_730_2,
    -0.027_219_029_917_103_5,
    -0.051_945_838_107_881_7,
    0.364_441_894_836_178_5,
    0.777_185_751_699_628_8,
    0.481_359_651_259_052_8,
    -0.061_273_359_067_810_8,
    -0.143_294_238_351_272_6,
    0.007_607_487_324_976_6,
    0.031_695_087_811_526_0,
    -0.000_542_132_331_800_0,
    -0.003_382_415_951_005_0,
];
const HAAR: [f64; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];

/// (spline order, dual order) pairs of the biorthogonal families.
const SPLINE_PAIRS: [(usize, usize); 12] = [
    (1, 1),
    (1, 3),
    (1, 5),
    (2, 2),
    (2, 4),
    (2, 6),
    (2, 8),
    (3, 1),
    (3, 3),
    (3, 5),
    (3, 7),
    (3, 9),
];

// ── Filters ──────────────────────────────────────────────────────────

/// Filter taps placed at integer offsets `start..start + taps.len()`.
#[derive(Debug, Clone, PartialEq)]
struct Filter {
    start: isize,
    taps: Vec<f64>,
}

impl Filter {
    fn new(start: isize, taps: Vec<f64>) -> Self {
        Self { start, taps }
    }

    fn mul(&self, other: &Filter) -> Filter {
        let mut taps = vec![0.0; self.taps.len() + other.taps.len() - 1];
        for (i, a) in self.taps.iter().enumerate() {
            for (j, b) in other.taps.iter().enumerate() {
                taps[i + j] += a * b;
            }
        }
        Filter::new(self.start + other.start, taps)
    }

    fn add_scaled(&self, other: &Filter, k: f64) -> Filter {
        let start = self.start.min(other.start);
        let end = (self.start + self.taps.len() as isize).max(other.start + other.taps.len() as isize);
        let mut taps = vec![0.0; (end - start) as usize];
        for (i, a) in self.taps.iter().enumerate() {
            taps[(self.start - start) as usize + i] += a;
        }
        for (i, b) in other.taps.iter().enumerate() {
            taps[(other.start - start) as usize + i] += k * b;
        }
        Filter::new(start, taps)
    }

    fn pow(&self, n: usize) -> Filter {
        (0..n).fold(Filter::new(0, vec![1.0]), |acc, _| acc.mul(self))
    }

    fn scaled(mut self, k: f64) -> Filter {
        self.taps.iter_mut().for_each(|t| *t *= k);
        self
    }

    /// `g[n] = (-1)^n f[1 - n]`.
    fn mirror(&self) -> Filter {
        let len = self.taps.len() as isize;
        let start = 2 - self.start - len;
        let taps = (0..len)
            .map(|j| {
                let v = self.taps[(len - 1 - j) as usize];
                if (start + j).rem_euclid(2) == 0 {
                    v
                } else {
                    -v
                }
            })
            .collect();
        Filter::new(start, taps)
    }
}

/// Analysis and synthesis low-pass filters with their high-pass mirrors.
#[derive(Debug, Clone)]
struct FilterBank {
    dec_lo: Filter,
    dec_hi: Filter,
    rec_lo: Filter,
    rec_hi: Filter,
}

impl FilterBank {
    fn biorthogonal(dec_lo: Filter, rec_lo: Filter) -> Self {
        Self {
            dec_hi: rec_lo.mirror(),
            rec_hi: dec_lo.mirror(),
            dec_lo,
            rec_lo,
        }
    }

    fn orthogonal(h: &[f64]) -> Self {
        let lo = Filter::new(0, h.to_vec());
        Self::biorthogonal(lo.clone(), lo)
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Primal B-spline and dual low-pass filters of CDF(`order`, `dual`).
fn spline_pair(order: usize, dual: usize) -> (Filter, Filter) {
    let half = Filter::new(0, vec![0.5, 0.5]);
    let sin2 = Filter::new(-1, vec![-0.25, 0.5, -0.25]);

    let mut primal = half.pow(order);
    primal.start = -((order / 2) as isize);

    let mut base = half.pow(dual);
    base.start = -((dual / 2) as isize);
    let l = (order + dual) / 2;
    let poly = (0..l).fold(Filter::new(0, vec![0.0]), |acc, n| {
        acc.add_scaled(&sin2.pow(n), binomial(l - 1 + n, n))
    });

    (primal.scaled(SQRT_2), base.mul(&poly).scaled(SQRT_2))
}

/// Filter bank for a wavelet name.
fn filter_bank(name: &str) -> Result<FilterBank, DenoiseError> {
    let lower = name.to_ascii_lowercase();
    let orthogonal: Option<&[f64]> = match lower.as_str() {
        "haar" | "db1" => Some(&HAAR[..]),
        "db2" | "sym2" => Some(&DB2[..]),
        "db3" | "sym3" => Some(&DB3[..]),
        "db4" => Some(&DB4[..]),
        "sym4" => Some(&SYM4[..]),
        "sym5" => Some(&SYM5[..]),
        "sym6" => Some(&SYM6[..]),
        "sym7" => Some(&SYM7[..]),
        "sym8" => Some(&SYM8[..]),
        _ => None,
    };
    if let Some(h) = orthogonal {
        return Ok(FilterBank::orthogonal(h));
    }

    let unknown = || DenoiseError::UnknownWavelet(name.to_string());
    let (reverse, orders) = if let Some(rest) = lower.strip_prefix("rbio") {
        (true, rest)
    } else if let Some(rest) = lower.strip_prefix("bior") {
        (false, rest)
    } else {
        return Err(unknown());
    };
    let (order, dual) = orders.split_once('.').ok_or_else(unknown)?;
    let order: usize = order.parse().map_err(|_| unknown())?;
    let dual: usize = dual.parse().map_err(|_| unknown())?;
    if !SPLINE_PAIRS.contains(&(order, dual)) {
        return Err(unknown());
    }

    // bior decomposes with the dual filter; rbio swaps the roles
    let (primal, dual) = spline_pair(order, dual);
    Ok(if reverse {
        FilterBank::biorthogonal(primal, dual)
    } else {
        FilterBank::biorthogonal(dual, primal)
    })
}

// ── Transform ────────────────────────────────────────────────────────

fn wrap(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

fn correlate(x: &[f64], f: &Filter, k: usize) -> f64 {
    let base = 2 * k as isize + f.start;
    f.taps
        .iter()
        .enumerate()
        .map(|(j, t)| t * x[wrap(base + j as isize, x.len())])
        .sum()
}

/// One analysis step on an even-length signal.
fn analyze(x: &[f64], bank: &FilterBank) -> (Vec<f64>, Vec<f64>) {
    let half = x.len() / 2;
    let approx = (0..half).map(|k| correlate(x, &bank.dec_lo, k)).collect();
    let detail = (0..half).map(|k| correlate(x, &bank.dec_hi, k)).collect();
    (approx, detail)
}

/// One synthesis step; inverse of [`analyze`].
fn synthesize(approx: &[f64], detail: &[f64], bank: &FilterBank) -> Vec<f64> {
    let n = approx.len() * 2;
    let mut x = vec![0.0; n];
    for k in 0..approx.len() {
        for (filter, coeff) in [(&bank.rec_lo, approx[k]), (&bank.rec_hi, detail[k])] {
            let base = 2 * k as isize + filter.start;
            for (j, t) in filter.taps.iter().enumerate() {
                x[wrap(base + j as isize, n)] += t * coeff;
            }
        }
    }
    x
}

/// Decompose to `level`, zero the detail bands, and reconstruct.
pub(super) fn denoise(data: &[f64], wavelet: &str, level: usize) -> Result<Vec<f64>, DenoiseError> {
    let bank = filter_bank(wavelet)?;

    // lengths before each stage's even-extension
    let mut lengths = Vec::with_capacity(level);
    let mut approx = data.to_vec();
    for _ in 0..level {
        if approx.len() < 2 {
            break;
        }
        lengths.push(approx.len());
        if approx.len() % 2 == 1 {
            if let Some(&last) = approx.last() {
                approx.push(last);
            }
        }
        approx = analyze(&approx, &bank).0;
    }

    for &len in lengths.iter().rev() {
        let zeros = vec![0.0; approx.len()];
        approx = synthesize(&approx, &zeros, &bank);
        approx.truncate(len);
    }
    Ok(approx)
}
