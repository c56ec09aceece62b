/// CTCSS access tones mapped to the CAT control parameter. Keys are the tone
/// frequencies shown to the operator; "OFF" disables the encoder.
const CTCSS_TONES: &[(&str, &str)] = &[
    ("OFF", "0"),
    ("67.0", "670"),
    ("69.3", "693"),
    ("71.9", "719"),
    ("74.4", "744"),
    ("77.0", "770"),
    ("79.7", "797"),
    ("82.5", "825"),
    ("85.4", "854"),
    ("88.5", "885"),
    ("91.5", "915"),
    ("94.8", "948"),
    ("97.4", "974"),
    ("100.0", "1000"),
    ("103.5", "1035"),
    ("107.2", "1072"),
    ("110.9", "1109"),
    ("114.8", "1148"),
    ("118.8", "1188"),
    ("123.0", "1230"),
    ("127.3", "1273"),
    ("131.8", "1318"),
    ("136.5", "1365"),
    ("141.3", "1413"),
    ("146.2", "1462"),
    ("151.4", "1514"),
    ("156.7", "1567"),
    ("159.8", "1598"),
    ("162.2", "1622"),
    ("165.5", "1655"),
    ("167.9", "1679"),
    ("171.3", "1713"),
    ("177.3", "1773"),
    ("179.9", "1799"),
    ("183.5", "1835"),
    ("186.2", "1862"),
    ("189.9", "1899"),
    ("192.8", "1928"),
    ("196.6", "1966"),
    ("199.5", "1995"),
    ("203.5", "2035"),
    ("206.5", "2065"),
    ("210.7", "2107"),
    ("218.1", "2181"),
    ("225.7", "2257"),
    ("229.1", "2291"),
    ("233.6", "2336"),
    ("241.8", "2418"),
    ("250.3", "2503"),
    ("254.1", "2541"),
];

/// CAT parameter for a configured tone, or None for an unknown tone string.
pub fn ctcss_param(tone: &str) -> Option<&'static str> {
    let tone = tone.trim();
    CTCSS_TONES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tone))
        .map(|(_, param)| *param)
}
