use anyhow::Result;
use std::process;

use ladle_core::models::Recipe;
use ladle_core::service::RecipeService;

use super::helpers::{json_error, print_recipe_table};

fn print_recipes(recipes: &[Recipe], empty_message: &str, json: bool) -> Result<()> {
    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else {
        let refs: Vec<&Recipe> = recipes.iter().collect();
        print_recipe_table(&refs);
    }
    Ok(())
}

pub(crate) fn cmd_list(service: &RecipeService, json: bool) -> Result<()> {
    let recipes = service.list_recipes()?;
    print_recipes(
        &recipes,
        "No recipes cached. Run 'ladle sync' to fetch them.",
        json,
    )
}

pub(crate) fn cmd_search(service: &RecipeService, query: &str, json: bool) -> Result<()> {
    let recipes = service.search_recipes(query)?;
    print_recipes(&recipes, &format!("No recipes match '{query}'"), json)
}

pub(crate) fn cmd_tag(service: &RecipeService, tag: &str, json: bool) -> Result<()> {
    let recipes = service.recipes_with_tag(tag)?;
    print_recipes(&recipes, &format!("No recipes tagged '{tag}'"), json)
}

pub(crate) fn cmd_starred(service: &RecipeService, json: bool) -> Result<()> {
    let recipes = service.starred_recipes()?;
    print_recipes(&recipes, "No starred recipes", json)
}

pub(crate) fn cmd_show(service: &RecipeService, id: i64, json: bool) -> Result<()> {
    let Some(recipe) = service.get_recipe(id)? else {
        if json {
            println!("{}", json_error(&format!("Recipe {id} not cached")));
        } else {
            eprintln!("Recipe {id} is not cached. Run 'ladle sync --recipe {id}' to fetch it.");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    let title = &recipe.title;
    println!("=== {title} ===");
    if !recipe.tags.is_empty() {
        let tags = recipe.tags.join(", ");
        println!("  Tags: {tags}");
    }
    if let Some(lang) = &recipe.language {
        println!("  Language: {lang}");
    }

    println!("\n  INGREDIENTS:");
    for ingredient in &recipe.ingredients {
        println!("    - {ingredient}");
    }

    println!("\n  DIRECTIONS:");
    for (i, step) in recipe.directions.iter().enumerate() {
        let n = i + 1;
        println!("    {n}. {step}");
    }

    if let Some(url) = &recipe.image_url {
        println!("\n  Picture: {url}");
    }
    if let Some(synced) = recipe.updated_at_local {
        let when = synced.format("%Y-%m-%d %H:%M");
        println!("  Last synced: {when}");
    }

    Ok(())
}

pub(crate) fn cmd_star(service: &RecipeService, id: i64, starred: bool, json: bool) -> Result<()> {
    if !service.set_starred(id, starred)? {
        if json {
            println!("{}", json_error(&format!("Recipe {id} not cached")));
        } else {
            eprintln!("Recipe {id} is not cached");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::json!({ "id": id, "starred": starred }));
    } else if starred {
        println!("Starred recipe {id}");
    } else {
        println!("Unstarred recipe {id}");
    }
    Ok(())
}
