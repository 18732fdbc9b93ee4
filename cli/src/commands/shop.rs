use anyhow::Result;
use std::process;

use ladle_core::models::ShoppingListItem;
use ladle_core::service::RecipeService;

use super::helpers::{json_error, print_item_table};

pub(crate) fn cmd_shop_add(service: &RecipeService, name: &str, json: bool) -> Result<()> {
    match service.add_shopping_item(name)? {
        Some(item) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                println!("Added {name}");
            }
        }
        None => {
            // Duplicate adds are a no-op, not an error
            if json {
                println!("{}", serde_json::json!({ "duplicate": name }));
            } else {
                println!("{name} is already on the list");
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_shop_list(service: &RecipeService, json: bool) -> Result<()> {
    let items = service.shopping_list()?;
    if items.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("Shopping list is empty");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        let refs: Vec<&ShoppingListItem> = items.iter().collect();
        print_item_table(&refs);
    }
    Ok(())
}

pub(crate) fn cmd_shop_check(
    service: &RecipeService,
    id: i64,
    checked: bool,
    json: bool,
) -> Result<()> {
    if !service.set_item_checked(id, checked)? {
        if json {
            println!("{}", json_error(&format!("No item with id {id}")));
        } else {
            eprintln!("No item with id {id}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::json!({ "id": id, "checked": checked }));
    } else if checked {
        println!("Checked item {id}");
    } else {
        println!("Unchecked item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_shop_remove(service: &RecipeService, id: i64, json: bool) -> Result<()> {
    if !service.delete_shopping_item(id)? {
        if json {
            println!("{}", json_error(&format!("No item with id {id}")));
        } else {
            eprintln!("No item with id {id}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::json!({ "removed": id }));
    } else {
        println!("Removed item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_shop_clear(service: &RecipeService, checked_only: bool, json: bool) -> Result<()> {
    let removed = if checked_only {
        service.delete_checked_items()?
    } else {
        service.clear_shopping_list()?
    };

    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else if checked_only {
        println!("Removed {removed} checked item(s)");
    } else {
        println!("Removed {removed} item(s)");
    }
    Ok(())
}
