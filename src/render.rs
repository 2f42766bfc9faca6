use crate::error::Result;
use crate::invoice::{DispatchKind, Invoice, LineItem};

/// A rendered invoice document plus the file name it should be saved
/// and attached under.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub html: String,
}

/// Turns an invoice into a paginated document. The shipped
/// implementation emits print-ready HTML; swapping in a PDF backend
/// only means implementing this trait.
pub trait DocumentRenderer {
    fn render(&self, invoice: &Invoice) -> Result<RenderedDocument>;
}

/// Format a money amount with Indian digit grouping: 123456 -> "1,23,456.00".
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let paise_total = (amount.abs() * 100.0).round() as u64;
    let rupees = paise_total / 100;
    let paise = paise_total % 100;

    let digits = rupees.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            parts.push(&head[end - 2..end]);
            end -= 2;
        }
        parts.push(&head[..end]);
        parts.reverse();
        format!("{},{}", parts.join(","), tail)
    };

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{paise:02}")
}

fn fmt_date(date: chrono::NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// HTML tax-invoice renderer. Column layout is dynamic: intra-state
/// invoices show CGST/SGST, inter-state invoices show a single IGST
/// column, decided by comparing buyer and seller state strings.
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn item_row(item: &LineItem, inter_state: bool) -> String {
        let desc = if item.description.is_empty() {
            String::new()
        } else {
            format!(
                r#"<div class="item-desc">{}</div>"#,
                item.description
            )
        };

        let tax_cells = if inter_state {
            format!(
                r#"<td class="r">{}%</td><td class="r">{}</td>"#,
                format_inr(item.gst_rate * 100.0),
                format_inr(item.igst)
            )
        } else {
            format!(
                r#"<td class="r">{}%</td><td class="r">{}</td><td class="r">{}</td>"#,
                format_inr(item.gst_rate * 100.0),
                format_inr(item.cgst),
                format_inr(item.sgst)
            )
        };

        format!(
            r#"<tr><td class="c">{}</td><td><div class="item-name">{}</div>{}</td><td class="c">{}</td><td class="c">{}</td><td class="r">{}</td><td class="r">{}</td>{}<td class="r"><strong>{}</strong></td></tr>"#,
            item.serial,
            item.name,
            desc,
            item.hsn,
            item.qty,
            format_inr(item.rate),
            format_inr(item.taxable),
            tax_cells,
            format_inr(item.line_total)
        )
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, invoice: &Invoice) -> Result<RenderedDocument> {
        let inter_state = invoice.buyer.state != invoice.seller.state;

        let tax_headers = if inter_state {
            r#"<th>GST%</th><th>IGST</th>"#
        } else {
            r#"<th>GST%</th><th>CGST</th><th>SGST</th>"#
        };

        let items_html: String = invoice
            .items
            .iter()
            .map(|item| Self::item_row(item, inter_state))
            .collect();

        let totals_tax_cells = if inter_state {
            format!(
                r#"<td></td><td class="r">{}</td>"#,
                format_inr(invoice.totals.igst)
            )
        } else {
            format!(
                r#"<td></td><td class="r">{}</td><td class="r">{}</td>"#,
                format_inr(invoice.totals.cgst),
                format_inr(invoice.totals.sgst)
            )
        };

        let summary_rows = if inter_state {
            format!(
                r#"<tr><td>IGST:</td><td class="r">{}</td></tr>"#,
                format_inr(invoice.totals.igst)
            )
        } else {
            format!(
                r#"<tr><td>CGST:</td><td class="r">{}</td></tr><tr><td>SGST:</td><td class="r">{}</td></tr>"#,
                format_inr(invoice.totals.cgst),
                format_inr(invoice.totals.sgst)
            )
        };

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
@page {{ size: A4; margin: 1.0in 0.5in 0.5in 0.5in; }}
body {{ font-family: Helvetica, Arial, sans-serif; font-size: 9pt; color: #333; }}
.header-box {{ border-bottom: 2px solid #c0392b; margin-bottom: 15px; padding-bottom: 5px; }}
.company-name {{ font-size: 18pt; font-weight: bold; color: #c0392b; }}
.title {{ font-size: 24pt; font-weight: bold; color: #2c3e50; text-align: right; }}
.info-table {{ width: 100%; margin-bottom: 20px; border-collapse: collapse; }}
.info-table td {{ vertical-align: top; padding: 2px 0; }}
.label {{ font-weight: bold; color: #555; padding-right: 10px; }}
.client-name {{ font-size: 12pt; font-weight: bold; }}
.items {{ width: 100%; border-collapse: collapse; margin-top: 10px; }}
.items th {{ background-color: #2c3e50; color: white; padding: 6px; font-size: 8pt; border: 1px solid #333; }}
.items td {{ padding: 6px; border: 1px solid #ccc; }}
.item-name {{ font-weight: bold; }}
.item-desc {{ font-size: 8pt; font-style: italic; color: #666; }}
.c {{ text-align: center; }}
.r {{ text-align: right; }}
.totals-row {{ background-color: #fff2cc; font-weight: bold; }}
.summary {{ float: right; width: 45%; border-collapse: collapse; margin-top: 20px; }}
.summary td {{ padding: 4px; }}
.grand {{ background-color: #f1c40f; font-weight: bold; font-size: 11pt; border-top: 2px solid black; border-bottom: 2px solid black; }}
.words {{ float: left; width: 50%; margin-top: 30px; font-style: italic; border-top: 1px solid #ccc; padding-top: 5px; }}
.disclaimer {{ margin-top: 40px; text-align: center; font-size: 8pt; color: #666; clear: both; border-top: 1px solid #eee; padding-top: 10px; }}
</style>
</head>
<body>
<div class="header-box">
<table width="100%"><tr>
<td><div class="company-name">{seller_name}</div><div>GSTIN: {seller_gstin}</div><div>{seller_address}</div></td>
<td class="title">TAX INVOICE</td>
</tr></table>
</div>
<table class="info-table"><tr>
<td width="55%">
<strong>Bill To:</strong>
<div class="client-name">{buyer_name}</div>
<div>GSTIN: {buyer_gstin}</div>
<div>Email: {buyer_email}</div>
<div>{buyer_address}</div>
</td>
<td width="45%">
<table align="right">
<tr><td class="label">Invoice No:</td><td><strong>{number}</strong></td></tr>
<tr><td class="label">Invoice Date:</td><td>{date}</td></tr>
<tr><td class="label">Due Date:</td><td>{due_date}</td></tr>
<tr><td class="label">Place of Supply:</td><td>{place_of_supply}</td></tr>
</table>
</td>
</tr></table>
<table class="items">
<thead><tr><th>Sr.</th><th>Item Description</th><th>HSN</th><th>Qty</th><th>Rate</th><th>Taxable</th>{tax_headers}<th>Total</th></tr></thead>
<tbody>
{items_html}
<tr class="totals-row"><td colspan="5" class="r">Total:</td><td class="r">{taxable}</td>{totals_tax_cells}<td class="r">{grand_total}</td></tr>
</tbody>
</table>
<table class="summary">
<tr><td>Taxable Amount:</td><td class="r">{taxable}</td></tr>
{summary_rows}
<tr class="grand"><td>Invoice Total:</td><td class="r">&#8377; {grand_total}</td></tr>
</table>
<div class="words"><strong>Total amount (in words):</strong><br>{amount_in_words}</div>
<div class="disclaimer">This is an electronically generated document, no signature is required.</div>
</body>
</html>
"#,
            seller_name = invoice.seller.name,
            seller_gstin = invoice.seller.gstin,
            seller_address = invoice.seller.address,
            buyer_name = invoice.buyer.name,
            buyer_gstin = invoice.buyer.gstin,
            buyer_email = invoice.buyer.email,
            buyer_address = invoice.buyer.address,
            number = invoice.number,
            date = fmt_date(invoice.date),
            due_date = fmt_date(invoice.due_date),
            place_of_supply = invoice.buyer.state,
            tax_headers = tax_headers,
            items_html = items_html,
            taxable = format_inr(invoice.totals.taxable),
            totals_tax_cells = totals_tax_cells,
            summary_rows = summary_rows,
            grand_total = format_inr(invoice.totals.grand_total),
            amount_in_words = invoice.totals.amount_in_words,
        );

        Ok(RenderedDocument {
            file_name: format!(
                "Invoice_{}_{}.html",
                invoice.number,
                invoice.buyer.name.replace(' ', "_")
            ),
            html,
        })
    }
}

/// Subject line for an invoice notification.
pub fn subject_for(invoice: &Invoice, kind: DispatchKind) -> String {
    match kind {
        DispatchKind::Reminder => format!(
            "Reminder: Invoice #{} from {}",
            invoice.number, invoice.seller.name
        ),
        _ => format!("Invoice #{} from {}", invoice.number, invoice.seller.name),
    }
}

/// Plain-text and HTML notification bodies for an invoice message.
pub fn notification_bodies(invoice: &Invoice, kind: DispatchKind) -> (String, String) {
    let reminder_line = match kind {
        DispatchKind::Reminder => {
            "This is a friendly reminder that the invoice below is awaiting payment.\n\n"
        }
        _ => "",
    };

    let plain = format!(
        "Dear {client},\n\n{reminder_line}Please find attached Invoice #{number} for \u{20b9} {total}.\n\n\
         Due date: {due}.\n\nThank you for your business.\n\nRegards,\n{company}",
        client = invoice.buyer.name,
        reminder_line = reminder_line,
        number = invoice.number,
        total = format_inr(invoice.totals.grand_total),
        due = fmt_date(invoice.due_date),
        company = invoice.seller.name,
    );

    let intro = match kind {
        DispatchKind::Reminder => {
            "This is a friendly reminder that the invoice below is awaiting payment."
        }
        _ => "Please find attached the invoice for our recent services. We appreciate your continued business.",
    };

    let html = format!(
        r#"<div style="background-color:#f6f6f6;padding:40px 0;font-family:Helvetica,Arial,sans-serif;">
<div style="max-width:600px;margin:0 auto;background:white;border-radius:8px;overflow:hidden;">
<div style="background-color:#2c3e50;padding:30px;text-align:center;">
<h1 style="color:white;margin:0;font-size:24px;font-weight:300;">{company}</h1>
</div>
<div style="padding:40px;color:#333;line-height:1.6;">
<div style="font-size:18px;font-weight:bold;margin-bottom:20px;">Hi {client},</div>
<p>{intro}</p>
<div style="background-color:#f8f9fa;border-left:5px solid #3498db;padding:20px;margin:25px 0;border-radius:4px;">
<table width="100%" cellpadding="0" cellspacing="0"><tr>
<td>
<div style="font-size:14px;margin-bottom:5px;"><span style="color:#777;font-weight:bold;">Invoice No:</span> <strong>{number}</strong></div>
<div style="font-size:14px;margin-bottom:5px;"><span style="color:#777;font-weight:bold;">Date:</span> {date}</div>
<div style="font-size:14px;"><span style="color:#777;font-weight:bold;">Due Date:</span> <strong style="color:#e67e22;">{due}</strong></div>
</td>
<td align="right" style="vertical-align:top;">
<div style="font-size:11px;color:#999;text-transform:uppercase;letter-spacing:1px;">Amount Due</div>
<div style="font-size:24px;font-weight:bold;color:#2c3e50;margin-top:5px;">&#8377; {total}</div>
</td>
</tr></table>
</div>
<p>The invoice document is attached to this email.</p>
<p style="margin-top:30px;">Best regards,<br><strong>Accounts Team</strong><br>{company}</p>
</div>
<div style="background-color:#f4f4f4;padding:20px;text-align:center;font-size:12px;color:#999;border-top:1px solid #eee;">{address}</div>
</div>
</div>"#,
        company = invoice.seller.name,
        client = invoice.buyer.name,
        intro = intro,
        number = invoice.number,
        date = fmt_date(invoice.date),
        due = fmt_date(invoice.due_date),
        total = format_inr(invoice.totals.grand_total),
        address = invoice.seller.address,
    );

    (plain, html)
}
