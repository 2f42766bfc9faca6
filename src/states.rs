//! Directory of Indian states with their GST state codes.
//!
//! State fields on clients and the seller profile hold the canonical
//! `"Name (Code)"` string produced by [`format_state`]. Tax resolution
//! compares these strings verbatim, so anything that writes a state
//! value should go through this module (or be validated against it).

/// GST state codes as published for GSTIN registration.
pub const STATES: &[(u8, &str)] = &[
    (1, "Jammu and Kashmir"),
    (2, "Himachal Pradesh"),
    (3, "Punjab"),
    (4, "Chandigarh"),
    (5, "Uttarakhand"),
    (6, "Haryana"),
    (7, "Delhi"),
    (8, "Rajasthan"),
    (9, "Uttar Pradesh"),
    (10, "Bihar"),
    (11, "Sikkim"),
    (12, "Arunachal Pradesh"),
    (13, "Nagaland"),
    (14, "Manipur"),
    (15, "Mizoram"),
    (16, "Tripura"),
    (17, "Meghalaya"),
    (18, "Assam"),
    (19, "West Bengal"),
    (20, "Jharkhand"),
    (21, "Odisha"),
    (22, "Chhattisgarh"),
    (23, "Madhya Pradesh"),
    (24, "Gujarat"),
    (26, "Dadra and Nagar Haveli and Daman and Diu"),
    (27, "Maharashtra"),
    (29, "Karnataka"),
    (30, "Goa"),
    (31, "Lakshadweep"),
    (32, "Kerala"),
    (33, "Tamil Nadu"),
    (34, "Puducherry"),
    (35, "Andaman and Nicobar Islands"),
    (36, "Telangana"),
    (37, "Andhra Pradesh"),
    (38, "Ladakh"),
    (97, "Other Territory"),
    (99, "Centre Jurisdiction"),
];

/// Canonical display form, e.g. `"Delhi (07)"`.
pub fn format_state(code: u8, name: &str) -> String {
    format!("{name} ({code:02})")
}

/// Whether `value` is one of the canonical `"Name (Code)"` strings.
pub fn is_known_state(value: &str) -> bool {
    STATES
        .iter()
        .any(|&(code, name)| format_state(code, name) == value)
}

/// Sorted list of canonical state strings, for templates and prompts.
pub fn state_list() -> Vec<String> {
    let mut list: Vec<String> = STATES
        .iter()
        .map(|&(code, name)| format_state(code, name))
        .collect();
    list.sort();
    list
}
