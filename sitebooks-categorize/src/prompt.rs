use sitebooks_core::{CONSTRUCTION_KEYWORDS, TransactionInput};

/// Build the single user prompt sent to the completion API.
pub fn build_prompt(txn: &TransactionInput) -> String {
    let merchant = txn
        .merchant_name
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("N/A");

    let mut s = String::new();
    s.push_str("You are an expert accountant specializing in construction company finances.\n");
    s.push_str("Analyze this transaction and categorize it for a construction business.\n\n");

    s.push_str("Transaction Details:\n");
    s.push_str(&format!("- Description: {}\n", txn.name));
    s.push_str(&format!("- Merchant: {}\n", merchant));
    s.push_str(&format!("- Amount: ${}\n", txn.amount.abs()));
    s.push_str(&format!("- Date: {}\n", txn.date));

    s.push_str("\nConstruction Industry Context:\n");
    for group in &CONSTRUCTION_KEYWORDS {
        s.push_str(&format!("- {}: {}\n", group.label, group.keywords.join(", ")));
    }

    s.push_str(
        "\nPlease categorize this transaction and respond with a JSON object containing:\n\
         - category: Primary category (Materials, Subcontractor, Equipment, Fuel, Office, Income, Other)\n\
         - subcategory: More specific category (e.g., \"Lumber\", \"Plumbing\", \"Concrete\", etc.)\n\
         - confidence: Number 0-1 indicating how confident you are\n\
         - reasoning: Brief explanation of why you chose this category\n\
         - suggestedProject: If this looks like it could be for a specific type of project, suggest it (Kitchen, Bathroom, Deck, etc.)\n\n\
         Focus on construction-specific categorization. Be precise and practical.\n",
    );
    s
}
