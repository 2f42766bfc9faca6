use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::{Archive, Client, Company, Product, TrackerEntry};
use crate::error::{BillError, Result};
use crate::tax::resolve_tax;
use crate::words::to_words;

/// A line item on the invoice, tax already resolved.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub serial: u32,
    pub name: String,
    pub description: String,
    pub hsn: String,
    pub qty: f64,
    pub rate: f64,
    pub discount: f64,
    pub taxable: f64,
    pub gst_rate: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub line_total: f64,
}

/// Column-wise sums over the item list.
#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub grand_total: f64,
    pub amount_in_words: String,
}

/// Complete invoice data for rendering and dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub seller: Company,
    pub buyer: Client,
    pub items: Vec<LineItem>,
    pub totals: Totals,
}

/// Header fields for a fresh invoice.
#[derive(Debug, Clone)]
pub struct Header {
    pub number: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Raw user input for one line: product name, quantity, flat discount.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub name: String,
    pub qty: f64,
    pub discount: f64,
}

impl RawLine {
    /// Parse item input like "Consulting:8" or "Consulting:8:500"
    /// into a raw line.
    pub fn parse(input: &str) -> Result<RawLine> {
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(BillError::InvalidItemFormat(input.to_string()));
        }

        let name = parts[0].trim();
        let qty_str = parts[1];

        let qty: f64 = qty_str.parse().map_err(|_| BillError::InvalidQuantity {
            item: name.to_string(),
            qty: qty_str.to_string(),
            reason: "must be a number".to_string(),
        })?;

        if qty <= 0.0 {
            return Err(BillError::InvalidQuantity {
                item: name.to_string(),
                qty: qty_str.to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let discount: f64 = match parts.get(2) {
            Some(d) => d.parse().map_err(|_| BillError::InvalidQuantity {
                item: name.to_string(),
                qty: d.to_string(),
                reason: "discount must be a number".to_string(),
            })?,
            None => 0.0,
        };

        Ok(RawLine {
            name: name.to_string(),
            qty,
            discount,
        })
    }
}

/// Build a name-keyed catalog from the id-keyed product table.
/// Ids are visited in sorted order so duplicate names resolve
/// first-match-wins deterministically.
pub fn catalog_by_name(products: &HashMap<String, Product>) -> HashMap<String, Product> {
    let mut ids: Vec<&String> = products.keys().collect();
    ids.sort();

    let mut by_name = HashMap::new();
    for id in ids {
        let product = &products[id];
        by_name
            .entry(product.name.clone())
            .or_insert_with(|| product.clone());
    }
    by_name
}

/// Build a name-keyed client table, same first-match-wins rule.
pub fn clients_by_name(clients: &HashMap<String, Client>) -> HashMap<String, Client> {
    let mut ids: Vec<&String> = clients.keys().collect();
    ids.sort();

    let mut by_name = HashMap::new();
    for id in ids {
        let client = &clients[id];
        by_name
            .entry(client.name.clone())
            .or_insert_with(|| client.clone());
    }
    by_name
}

fn line_from_raw(serial: u32, raw: &RawLine, product: Option<&Product>, buyer_state: &str, seller_state: &str) -> LineItem {
    let (description, hsn, rate, gst_rate) = match product {
        Some(p) => (p.description.clone(), p.hsn.clone(), p.rate, p.gst_rate),
        None => (String::new(), String::new(), 0.0, 0.0),
    };

    let taxable = raw.qty * rate - raw.discount;
    let tax = resolve_tax(taxable, gst_rate, buyer_state, seller_state);

    LineItem {
        serial,
        name: raw.name.clone(),
        description,
        hsn,
        qty: raw.qty,
        rate,
        discount: raw.discount,
        taxable,
        gst_rate,
        cgst: tax.cgst,
        sgst: tax.sgst,
        igst: tax.igst,
        line_total: taxable + tax.total(),
    }
}

fn totals_over(items: &[LineItem]) -> Totals {
    let taxable: f64 = items.iter().map(|i| i.taxable).sum();
    let cgst: f64 = items.iter().map(|i| i.cgst).sum();
    let sgst: f64 = items.iter().map(|i| i.sgst).sum();
    let igst: f64 = items.iter().map(|i| i.igst).sum();
    let grand_total = taxable + cgst + sgst + igst;

    Totals {
        taxable,
        cgst,
        sgst,
        igst,
        grand_total,
        amount_in_words: to_words(grand_total.round().max(0.0) as u64),
    }
}

/// Compose a normalized invoice from raw form input.
///
/// Lines with an empty product name are skipped; the rest pick up
/// description/HSN/rate/GST defaults from the catalog (a miss logs a
/// warning and leaves them blank). Fails if the buyer name is blank or
/// no items survive. Performs no persistence.
pub fn compose(
    header: &Header,
    buyer: &Client,
    seller: &Company,
    raw_lines: &[RawLine],
    catalog: &HashMap<String, Product>,
) -> Result<Invoice> {
    if buyer.name.trim().is_empty() {
        return Err(BillError::MissingClientName);
    }

    let mut items = Vec::new();
    for raw in raw_lines {
        if raw.name.is_empty() {
            continue;
        }
        let product = catalog.get(&raw.name);
        if product.is_none() {
            tracing::warn!(item = %raw.name, invoice = %header.number,
                "product not in catalog, using blank defaults");
        }
        let serial = items.len() as u32 + 1;
        items.push(line_from_raw(serial, raw, product, &buyer.state, &seller.state));
    }

    if items.is_empty() {
        return Err(BillError::NoItems);
    }

    let totals = totals_over(&items);

    Ok(Invoice {
        number: header.number.clone(),
        date: header.date,
        due_date: header.due_date,
        seller: seller.clone(),
        buyer: buyer.clone(),
        items,
        totals,
    })
}

/// Rebuild an invoice from its archived line items for a resend or
/// reminder. The buyer is looked up by name; the recipient email stays
/// the one on the tracker row. Descriptions are refreshed from the
/// catalog. Totals are recomputed from the archived columns, so a
/// round trip through the archive reproduces the composed totals.
pub fn reconstruct(
    entry: &TrackerEntry,
    archive: &Archive,
    clients: &HashMap<String, Client>,
    catalog: &HashMap<String, Product>,
    seller: &Company,
) -> Result<Invoice> {
    let on_file = clients
        .get(&entry.client)
        .ok_or_else(|| BillError::ClientNotFound(entry.client.clone()))?;

    let buyer = Client {
        name: entry.client.clone(),
        email: entry.email.clone(),
        gstin: on_file.gstin.clone(),
        address: on_file.address.clone(),
        state: on_file.state.clone(),
    };

    let archived = archive.items_for(&entry.number);
    if archived.is_empty() {
        return Err(BillError::NoArchivedItems(entry.number.clone()));
    }

    let items: Vec<LineItem> = archived
        .iter()
        .map(|row| LineItem {
            serial: row.serial,
            name: row.name.clone(),
            description: catalog
                .get(&row.name)
                .map(|p| p.description.clone())
                .unwrap_or_default(),
            hsn: row.hsn.clone(),
            qty: row.qty,
            rate: row.rate,
            discount: row.discount,
            taxable: row.taxable,
            gst_rate: row.gst_rate,
            cgst: row.cgst,
            sgst: row.sgst,
            igst: row.igst,
            line_total: row.line_total,
        })
        .collect();

    let totals = totals_over(&items);

    Ok(Invoice {
        number: entry.number.clone(),
        date: entry.invoice_date,
        due_date: entry.due_date,
        seller: seller.clone(),
        buyer,
        items,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchivedItem;
    use crate::invoice::{FollowUpUnit, Status};

    fn seller() -> Company {
        Company {
            name: "Acme Services".to_string(),
            email: "billing@acme.example".to_string(),
            gstin: "07AABCU9603R1Z2".to_string(),
            address: "Delhi".to_string(),
            state: "Delhi (07)".to_string(),
        }
    }

    fn buyer(state: &str) -> Client {
        Client {
            name: "Globex".to_string(),
            email: "ap@globex.example".to_string(),
            gstin: "29AAACE1234F1Z5".to_string(),
            address: "Bengaluru".to_string(),
            state: state.to_string(),
        }
    }

    fn catalog() -> HashMap<String, Product> {
        let mut products = HashMap::new();
        products.insert(
            "consulting".to_string(),
            Product {
                name: "Consulting".to_string(),
                description: "Technical consulting".to_string(),
                hsn: "998313".to_string(),
                rate: 1000.0,
                gst_rate: 0.18,
            },
        );
        catalog_by_name(&products)
    }

    fn header() -> Header {
        Header {
            number: "INV-001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 25).unwrap(),
        }
    }

    #[test]
    fn parse_item_input_variants() {
        assert_eq!(
            RawLine::parse("Consulting:8").unwrap(),
            RawLine {
                name: "Consulting".to_string(),
                qty: 8.0,
                discount: 0.0
            }
        );
        assert_eq!(RawLine::parse("Consulting:8:500").unwrap().discount, 500.0);
        assert!(RawLine::parse("Consulting").is_err());
        assert!(RawLine::parse("Consulting:abc").is_err());
        assert!(RawLine::parse("Consulting:0").is_err());
    }

    #[test]
    fn compose_intra_state_splits_cgst_sgst() {
        let raw = vec![RawLine {
            name: "Consulting".to_string(),
            qty: 1.0,
            discount: 0.0,
        }];
        let invoice = compose(&header(), &buyer("Delhi (07)"), &seller(), &raw, &catalog()).unwrap();

        let line = &invoice.items[0];
        assert_eq!(line.taxable, 1000.0);
        assert_eq!(line.cgst, 90.0);
        assert_eq!(line.sgst, 90.0);
        assert_eq!(line.igst, 0.0);
        assert_eq!(line.line_total, 1180.0);
    }

    #[test]
    fn compose_three_lines_end_to_end() {
        // taxable 1000 / 500 / 250, same state, 18% each
        let raw = vec![
            RawLine {
                name: "Consulting".to_string(),
                qty: 1.0,
                discount: 0.0,
            },
            RawLine {
                name: "Consulting".to_string(),
                qty: 0.5,
                discount: 0.0,
            },
            RawLine {
                name: "Consulting".to_string(),
                qty: 0.25,
                discount: 0.0,
            },
        ];
        let invoice = compose(&header(), &buyer("Delhi (07)"), &seller(), &raw, &catalog()).unwrap();

        assert_eq!(invoice.totals.taxable, 1750.0);
        assert!((invoice.totals.cgst - 157.5).abs() < 1e-9);
        assert!((invoice.totals.sgst - 157.5).abs() < 1e-9);
        assert_eq!(invoice.totals.igst, 0.0);
        assert!((invoice.totals.grand_total - 2065.0).abs() < 1e-9);
        assert_eq!(
            invoice.totals.amount_in_words,
            "Two Thousand Sixty Five Rupees Only"
        );
    }

    #[test]
    fn every_line_has_one_tax_side() {
        for state in ["Delhi (07)", "Karnataka (29)"] {
            let raw = vec![RawLine {
                name: "Consulting".to_string(),
                qty: 3.0,
                discount: 100.0,
            }];
            let invoice = compose(&header(), &buyer(state), &seller(), &raw, &catalog()).unwrap();
            for line in &invoice.items {
                let split_side = line.cgst + line.sgst;
                assert!(split_side == 0.0 || line.igst == 0.0);
                assert!(
                    (line.line_total - (line.taxable + line.cgst + line.sgst + line.igst)).abs()
                        < 1e-9
                );
            }
        }
    }

    #[test]
    fn unknown_product_gets_blank_defaults() {
        let raw = vec![RawLine {
            name: "Mystery".to_string(),
            qty: 2.0,
            discount: 0.0,
        }];
        let invoice = compose(&header(), &buyer("Delhi (07)"), &seller(), &raw, &catalog()).unwrap();

        let line = &invoice.items[0];
        assert_eq!(line.description, "");
        assert_eq!(line.rate, 0.0);
        assert_eq!(line.taxable, 0.0);
        assert_eq!(line.line_total, 0.0);
    }

    #[test]
    fn blank_client_and_empty_items_are_rejected() {
        let mut anonymous = buyer("Delhi (07)");
        anonymous.name = "  ".to_string();
        let raw = vec![RawLine {
            name: "Consulting".to_string(),
            qty: 1.0,
            discount: 0.0,
        }];
        assert!(matches!(
            compose(&header(), &anonymous, &seller(), &raw, &catalog()),
            Err(BillError::MissingClientName)
        ));

        assert!(matches!(
            compose(&header(), &buyer("Delhi (07)"), &seller(), &[], &catalog()),
            Err(BillError::NoItems)
        ));
    }

    #[test]
    fn reconstruction_round_trips_totals_and_words() {
        let raw = vec![
            RawLine {
                name: "Consulting".to_string(),
                qty: 2.0,
                discount: 150.0,
            },
            RawLine {
                name: "Consulting".to_string(),
                qty: 1.0,
                discount: 0.0,
            },
        ];
        let composed = compose(&header(), &buyer("Karnataka (29)"), &seller(), &raw, &catalog()).unwrap();

        let archive = Archive {
            items: composed
                .items
                .iter()
                .map(|line| ArchivedItem {
                    invoice: composed.number.clone(),
                    serial: line.serial,
                    name: line.name.clone(),
                    hsn: line.hsn.clone(),
                    qty: line.qty,
                    rate: line.rate,
                    discount: line.discount,
                    taxable: line.taxable,
                    gst_rate: line.gst_rate,
                    cgst: line.cgst,
                    sgst: line.sgst,
                    igst: line.igst,
                    line_total: line.line_total,
                })
                .collect(),
        };

        let entry = TrackerEntry {
            number: composed.number.clone(),
            client: composed.buyer.name.clone(),
            email: composed.buyer.email.clone(),
            grand_total: composed.totals.grand_total,
            invoice_date: composed.date,
            due_date: composed.due_date,
            status: Status::Sent,
            follow_up_value: 3,
            follow_up_unit: FollowUpUnit::Days,
            last_sent_at: None,
            next_due_at: None,
            notes: String::new(),
        };

        let mut clients = HashMap::new();
        clients.insert("globex".to_string(), buyer("Karnataka (29)"));
        let by_name = clients_by_name(&clients);

        let rebuilt = reconstruct(&entry, &archive, &by_name, &catalog(), &seller()).unwrap();

        assert_eq!(rebuilt.items.len(), composed.items.len());
        assert!((rebuilt.totals.grand_total - composed.totals.grand_total).abs() < 1e-9);
        assert_eq!(rebuilt.totals.amount_in_words, composed.totals.amount_in_words);
    }

    #[test]
    fn reconstruction_without_client_or_items_fails() {
        let entry = TrackerEntry {
            number: "INV-009".to_string(),
            client: "Nobody".to_string(),
            email: "x@example.com".to_string(),
            grand_total: 0.0,
            invoice_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 16).unwrap(),
            status: Status::Sent,
            follow_up_value: 3,
            follow_up_unit: FollowUpUnit::Days,
            last_sent_at: None,
            next_due_at: None,
            notes: String::new(),
        };

        let empty_clients = HashMap::new();
        let err = reconstruct(&entry, &Archive::default(), &empty_clients, &catalog(), &seller())
            .unwrap_err();
        assert!(matches!(err, BillError::ClientNotFound(_)));

        let mut clients = HashMap::new();
        clients.insert(
            "nobody".to_string(),
            Client {
                name: "Nobody".to_string(),
                email: "x@example.com".to_string(),
                gstin: String::new(),
                address: String::new(),
                state: "Delhi (07)".to_string(),
            },
        );
        let by_name = clients_by_name(&clients);
        let err =
            reconstruct(&entry, &Archive::default(), &by_name, &catalog(), &seller()).unwrap_err();
        assert!(matches!(err, BillError::NoArchivedItems(_)));
    }
}
