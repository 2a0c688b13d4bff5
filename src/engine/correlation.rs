use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Defined(f64),
    Undefined,
}

impl Correlation {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(value),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

pub fn kendall_tau_b(xs: &[f64], ys: &[f64]) -> Correlation {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Correlation::Undefined;
    }
    if xs.iter().chain(ys).any(|value| !value.is_finite()) {
        return Correlation::Undefined;
    }

    let mut concordant = 0_u64;
    let mut discordant = 0_u64;
    let mut tied_x_only = 0_u64;
    let mut tied_y_only = 0_u64;

    for i in 0..xs.len() {
        for j in (i + 1)..xs.len() {
            let x_cmp = compare(xs[i], xs[j]);
            let y_cmp = compare(ys[i], ys[j]);
            match (x_cmp, y_cmp) {
                (Ordering::Equal, Ordering::Equal) => {}
                (Ordering::Equal, _) => tied_x_only += 1,
                (_, Ordering::Equal) => tied_y_only += 1,
                (x, y) if x == y => concordant += 1,
                _ => discordant += 1,
            }
        }
    }

    let untied = concordant + discordant;
    let denominator = (((untied + tied_x_only) as f64) * ((untied + tied_y_only) as f64)).sqrt();
    if denominator == 0.0 {
        return Correlation::Undefined;
    }

    let tau = (concordant as f64 - discordant as f64) / denominator;
    Correlation::Defined(tau.clamp(-1.0, 1.0))
}

fn compare(left: f64, right: f64) -> Ordering {
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

pub fn mean_defined<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Correlation>,
{
    let mut total = 0.0_f64;
    let mut count = 0_usize;
    for value in values.into_iter().filter_map(Correlation::value) {
        total += value;
        count += 1;
    }
    (count > 0).then(|| total / count as f64)
}
