//! Country assignment (pipeline step 1 -> 2).
//!
//! Every seat draws one country from a 200+ entry pool via a seeded
//! shuffle, so the same session seed always deals the same map.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::PhaseError;
use crate::pipeline::players::Roster;
use crate::pipeline::session::{GameMode, PipelinePhase, Session};

/// One seat's country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAssignment {
    pub seat: u32,
    pub country: String,
}

/// The persisted country-assignment artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountriesDoc {
    pub phase: u8,
    pub mode: GameMode,
    pub assignments: Vec<CountryAssignment>,
    pub created_utc: String,
}

impl CountriesDoc {
    /// The country held by `seat`, if assigned.
    #[must_use]
    pub fn country_for(&self, seat: u32) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.seat == seat)
            .map(|a| a.country.as_str())
    }
}

/// Normalize a multiline pool: trim, uppercase, drop blanks and
/// `#`-comment lines, de-dupe preserving first occurrence.
#[must_use]
pub fn normalize_pool(pool_text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in pool_text.lines() {
        let name = raw.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        let name = name.to_uppercase();
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Deal one country per seat from the built-in pool.
///
/// Returns the advanced session (with a pinned seed) and the assignment
/// artifact.
///
/// # Errors
///
/// Returns [`PhaseError::WrongPhase`] unless the session is seated, or
/// [`PhaseError::PoolTooSmall`] when the pool cannot cover every seat.
pub fn assign_countries(
    session: &Session,
    roster: &Roster,
    created_utc: &str,
) -> Result<(Session, CountriesDoc), PhaseError> {
    session.expect_phase(PipelinePhase::Seated)?;
    roster.validate()?;

    let mut pool = normalize_pool(COUNTRY_POOL_TEXT);
    let needed = roster.seats_total as usize;
    if pool.len() < needed {
        return Err(PhaseError::PoolTooSmall {
            available: pool.len(),
            needed,
        });
    }

    let (session, seed) = session.ensure_seed();
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    pool.shuffle(&mut rng);

    let assignments = roster
        .seats()
        .zip(pool)
        .map(|(seat, country)| CountryAssignment { seat, country })
        .collect();

    let doc = CountriesDoc {
        phase: PipelinePhase::CountriesAssigned.step(),
        mode: session.mode,
        assignments,
        created_utc: created_utc.to_string(),
    };

    Ok((session.advanced_to(PipelinePhase::CountriesAssigned), doc))
}

/// Country and territory pool, one entry per line. Comments and blank
/// lines are stripped by [`normalize_pool`].
pub const COUNTRY_POOL_TEXT: &str = "
AFGHANISTAN
ALBANIA
ALGERIA
ANDORRA
ANGOLA
ANTIGUA AND BARBUDA
ARGENTINA
ARMENIA
AUSTRALIA
AUSTRIA
AZERBAIJAN
BAHAMAS
BAHRAIN
BANGLADESH
BARBADOS
BELARUS
BELGIUM
BELIZE
BENIN
BHUTAN
BOLIVIA
BOSNIA AND HERZEGOVINA
BOTSWANA
BRAZIL
BRUNEI
BULGARIA
BURKINA FASO
BURUNDI
CABO VERDE
CAMBODIA
CAMEROON
CANADA
CENTRAL AFRICAN REPUBLIC
CHAD
CHILE
CHINA
COLOMBIA
COMOROS
CONGO (REPUBLIC OF THE)
CONGO (DEMOCRATIC REPUBLIC OF THE)
COSTA RICA
COTE D'IVOIRE
CROATIA
CUBA
CYPRUS
CZECHIA
DENMARK
DJIBOUTI
DOMINICA
DOMINICAN REPUBLIC
ECUADOR
EGYPT
EL SALVADOR
EQUATORIAL GUINEA
ERITREA
ESTONIA
ESWATINI
ETHIOPIA
FIJI
FINLAND
FRANCE
GABON
GAMBIA
GEORGIA
GERMANY
GHANA
GREECE
GRENADA
GUATEMALA
GUINEA
GUINEA-BISSAU
GUYANA
HAITI
HONDURAS
HUNGARY
ICELAND
INDIA
INDONESIA
IRAN
IRAQ
IRELAND
ISRAEL
ITALY
JAMAICA
JAPAN
JORDAN
KAZAKHSTAN
KENYA
KIRIBATI
KUWAIT
KYRGYZSTAN
LAOS
LATVIA
LEBANON
LESOTHO
LIBERIA
LIBYA
LIECHTENSTEIN
LITHUANIA
LUXEMBOURG
MADAGASCAR
MALAWI
MALAYSIA
MALDIVES
MALI
MALTA
MARSHALL ISLANDS
MAURITANIA
MAURITIUS
MEXICO
MICRONESIA
MOLDOVA
MONACO
MONGOLIA
MONTENEGRO
MOROCCO
MOZAMBIQUE
MYANMAR
NAMIBIA
NAURU
NEPAL
NETHERLANDS
NEW ZEALAND
NICARAGUA
NIGER
NIGERIA
NORTH KOREA
NORTH MACEDONIA
NORWAY
OMAN
PAKISTAN
PALAU
PANAMA
PAPUA NEW GUINEA
PARAGUAY
PERU
PHILIPPINES
POLAND
PORTUGAL
QATAR
ROMANIA
RUSSIA
RWANDA
SAINT KITTS AND NEVIS
SAINT LUCIA
SAINT VINCENT AND THE GRENADINES
SAMOA
SAN MARINO
SAO TOME AND PRINCIPE
SAUDI ARABIA
SENEGAL
SERBIA
SEYCHELLES
SIERRA LEONE
SINGAPORE
SLOVAKIA
SLOVENIA
SOLOMON ISLANDS
SOMALIA
SOUTH AFRICA
SOUTH KOREA
SOUTH SUDAN
SPAIN
SRI LANKA
SUDAN
SURINAME
SWEDEN
SWITZERLAND
SYRIA
TAJIKISTAN
TANZANIA
THAILAND
TIMOR-LESTE
TOGO
TONGA
TRINIDAD AND TOBAGO
TUNISIA
TURKEY
TURKMENISTAN
TUVALU
UGANDA
UKRAINE
UNITED ARAB EMIRATES
UNITED KINGDOM
UNITED STATES
URUGUAY
UZBEKISTAN
VANUATU
VENEZUELA
VIETNAM
YEMEN
ZAMBIA
ZIMBABWE

# Extras / territories / non-UN observers (pushes comfortably over 200)
TAIWAN
PALESTINE
KOSOVO
HONG KONG
MACAO
GREENLAND
PUERTO RICO
FAROE ISLANDS
WESTERN SAHARA
VATICAN CITY
CURACAO
ARUBA
BONAIRE
SINT MAARTEN
SINT EUSTATIUS
SABA
GIBRALTAR
BERMUDA
CAYMAN ISLANDS
BRITISH VIRGIN ISLANDS
US VIRGIN ISLANDS
GUAM
AMERICAN SAMOA
NORTHERN MARIANA ISLANDS
FRENCH POLYNESIA
NEW CALEDONIA
WALLIS AND FUTUNA
SAINT PIERRE AND MIQUELON
MARTINIQUE
GUADELOUPE
REUNION
MAYOTTE
FRENCH GUIANA
";

#[cfg(test)]
mod tests {
    use super::*;

    fn seated_session() -> Session {
        Session::new(GameMode::Solo, "2026-08-29T00:00:00+00:00")
            .advanced_to(PipelinePhase::Seated)
    }

    fn roster(seats: u32) -> Roster {
        let ais = (1..=seats).map(|n| format!("AI-{n}")).collect();
        Roster::new(vec![], ais).unwrap()
    }

    #[test]
    fn pool_normalizes_clean_and_large() {
        let pool = normalize_pool(COUNTRY_POOL_TEXT);
        assert!(pool.len() > 200, "pool has {} entries", pool.len());
        assert!(pool.iter().all(|c| !c.is_empty() && !c.starts_with('#')));
        assert!(pool.contains(&"TAIWAN".to_string()));
    }

    #[test]
    fn normalize_dedupes_preserving_first_occurrence() {
        let pool = normalize_pool("chile\n# note\nPERU\n\n Chile \nperu\nBRAZIL");
        assert_eq!(pool, vec!["CHILE", "PERU", "BRAZIL"]);
    }

    #[test]
    fn assignment_covers_every_seat_uniquely() {
        let (_, doc) = assign_countries(&seated_session(), &roster(6), "t").unwrap();
        assert_eq!(doc.assignments.len(), 6);
        let mut countries: Vec<_> = doc.assignments.iter().map(|a| &a.country).collect();
        countries.sort();
        countries.dedup();
        assert_eq!(countries.len(), 6);
        assert_eq!(doc.assignments[0].seat, 1);
        assert_eq!(doc.phase, 2);
    }

    #[test]
    fn same_seed_deals_the_same_map() {
        let (first_session, first) = assign_countries(&seated_session(), &roster(4), "t").unwrap();
        let (_, second) = assign_countries(&seated_session(), &roster(4), "t").unwrap();
        assert_eq!(first.assignments, second.assignments);
        assert!(first_session.seed.is_some());
    }

    #[test]
    fn lobby_session_is_blocked() {
        let lobby = Session::new(GameMode::Solo, "t");
        let err = assign_countries(&lobby, &roster(2), "t").unwrap_err();
        assert_eq!(err, PhaseError::WrongPhase { expected: 1, found: 0 });
    }
}
