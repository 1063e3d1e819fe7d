//! Spanish cardinal spelling for the normalizer's digit-replacement step.

const UNITS: [&str; 30] = [
    "cero",
    "uno",
    "dos",
    "tres",
    "cuatro",
    "cinco",
    "seis",
    "siete",
    "ocho",
    "nueve",
    "diez",
    "once",
    "doce",
    "trece",
    "catorce",
    "quince",
    "dieciséis",
    "diecisiete",
    "dieciocho",
    "diecinueve",
    "veinte",
    "veintiuno",
    "veintidós",
    "veintitrés",
    "veinticuatro",
    "veinticinco",
    "veintiséis",
    "veintisiete",
    "veintiocho",
    "veintinueve",
];

const TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "ciento",
    "doscientos",
    "trescientos",
    "cuatrocientos",
    "quinientos",
    "seiscientos",
    "setecientos",
    "ochocientos",
    "novecientos",
];

/// Spell a pure-ASCII-digit token as Spanish cardinal words, one word per
/// element. Returns None when the token contains any non-digit character.
/// Tokens too large for u64 are spelled digit by digit.
pub fn spell_digit_token(token: &str) -> Option<Vec<String>> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let words = match token.parse::<u64>() {
        Ok(n) => cardinal(n)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        Err(_) => token
            .bytes()
            .map(|b| UNITS[(b - b'0') as usize].to_string())
            .collect(),
    };
    Some(words)
}

/// Spanish cardinal for any u64. Long-scale: 10^6 "millón", 10^9 "mil
/// millones", 10^12 "billón".
pub fn cardinal(n: u64) -> String {
    if n == 0 {
        return "cero".to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let billions = n / 1_000_000_000_000;
    let below = n % 1_000_000_000_000;
    if billions > 0 {
        let noun = if billions == 1 { "billón" } else { "billones" };
        parts.push(format!("{} {noun}", apocope(cardinal(billions))));
    }

    let millions = below / 1_000_000;
    let rest = below % 1_000_000;
    if millions > 0 {
        let noun = if millions == 1 { "millón" } else { "millones" };
        parts.push(format!("{} {noun}", apocope(sub_million(millions))));
    }
    if rest > 0 {
        parts.push(sub_million(rest));
    }
    parts.join(" ")
}

fn sub_million(n: u64) -> String {
    let thousands = n / 1000;
    let rest = n % 1000;
    let mut parts: Vec<String> = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("mil".to_string()),
        _ => parts.push(format!("{} mil", apocope(sub_thousand(thousands)))),
    }
    if rest > 0 {
        parts.push(sub_thousand(rest));
    }
    parts.join(" ")
}

fn sub_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    let tail = sub_hundred(rest);
    match hundreds {
        0 => tail,
        1 if rest == 0 => "cien".to_string(),
        1 => format!("ciento {tail}"),
        _ if rest == 0 => HUNDREDS[hundreds as usize].to_string(),
        _ => format!("{} {tail}", HUNDREDS[hundreds as usize]),
    }
}

fn sub_hundred(n: u64) -> String {
    if n < 30 {
        return UNITS[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        u => format!("{tens} y {}", UNITS[u as usize]),
    }
}

/// "uno" shortens before a masculine noun: un millón, veintiún mil,
/// treinta y un mil.
fn apocope(s: String) -> String {
    if s == "uno" {
        "un".to_string()
    } else if let Some(stem) = s.strip_suffix(" uno") {
        format!("{stem} un")
    } else if let Some(stem) = s.strip_suffix("tiuno") {
        format!("{stem}tiún")
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers() {
        assert_eq!(cardinal(0), "cero");
        assert_eq!(cardinal(2), "dos");
        assert_eq!(cardinal(15), "quince");
        assert_eq!(cardinal(16), "dieciséis");
        assert_eq!(cardinal(21), "veintiuno");
        assert_eq!(cardinal(23), "veintitrés");
        assert_eq!(cardinal(29), "veintinueve");
    }

    #[test]
    fn tens_join_with_y() {
        assert_eq!(cardinal(30), "treinta");
        assert_eq!(cardinal(31), "treinta y uno");
        assert_eq!(cardinal(47), "cuarenta y siete");
        assert_eq!(cardinal(99), "noventa y nueve");
    }

    #[test]
    fn hundreds() {
        assert_eq!(cardinal(100), "cien");
        assert_eq!(cardinal(101), "ciento uno");
        assert_eq!(cardinal(121), "ciento veintiuno");
        assert_eq!(cardinal(200), "doscientos");
        assert_eq!(cardinal(555), "quinientos cincuenta y cinco");
        assert_eq!(cardinal(700), "setecientos");
        assert_eq!(cardinal(999), "novecientos noventa y nueve");
    }

    #[test]
    fn thousands() {
        assert_eq!(cardinal(1000), "mil");
        assert_eq!(cardinal(1001), "mil uno");
        assert_eq!(cardinal(2024), "dos mil veinticuatro");
        assert_eq!(cardinal(21_000), "veintiún mil");
        assert_eq!(cardinal(31_000), "treinta y un mil");
        assert_eq!(cardinal(100_000), "cien mil");
    }

    #[test]
    fn millions_and_up() {
        assert_eq!(cardinal(1_000_000), "un millón");
        assert_eq!(cardinal(2_000_000), "dos millones");
        assert_eq!(cardinal(1_000_001), "un millón uno");
        assert_eq!(cardinal(23_000_000), "veintitrés millones");
        assert_eq!(cardinal(1_000_000_000), "mil millones");
        assert_eq!(cardinal(1_000_000_000_000), "un billón");
    }

    #[test]
    fn digit_token_expansion() {
        assert_eq!(spell_digit_token("2"), Some(vec!["dos".to_string()]));
        assert_eq!(
            spell_digit_token("123"),
            Some(vec!["ciento".to_string(), "veintitrés".to_string()])
        );
        // leading zeros read as the plain value
        assert_eq!(spell_digit_token("007"), Some(vec!["siete".to_string()]));
        assert_eq!(spell_digit_token("3a"), None);
        assert_eq!(spell_digit_token("3,5"), None);
        assert_eq!(spell_digit_token(""), None);
    }

    #[test]
    fn oversized_token_spelled_digit_by_digit() {
        let words = spell_digit_token("99999999999999999999").unwrap();
        assert_eq!(words.len(), 20);
        assert!(words.iter().all(|w| w == "nueve"));
    }
}
