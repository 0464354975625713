// ============================================================
// Layer 3 — Periodic Table
// ============================================================
// Maps element symbols to positions in the 118-wide
// composition vector (index = atomic number - 1).

/// Element symbols ordered by atomic number, H (1) through Og (118).
pub const ELEMENTS: [&str; 118] = [
    "H",  "He", "Li", "Be", "B",  "C",  "N",  "O",  "F",  "Ne",
    "Na", "Mg", "Al", "Si", "P",  "S",  "Cl", "Ar", "K",  "Ca",
    "Sc", "Ti", "V",  "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y",  "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I",  "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W",  "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U",  "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Zero-based composition index for a symbol, or None if unknown.
pub fn element_index(symbol: &str) -> Option<usize> {
    ELEMENTS.iter().position(|&e| e == symbol)
}

/// Count atoms per element. Returns the first unknown symbol on failure.
pub fn composition_counts<S: AsRef<str>>(symbols: &[S]) -> Result<Vec<f32>, String> {
    let mut counts = vec![0.0f32; ELEMENTS.len()];
    for s in symbols {
        let s = s.as_ref();
        let idx = element_index(s).ok_or_else(|| s.to_string())?;
        counts[idx] += 1.0;
    }
    Ok(counts)
}
