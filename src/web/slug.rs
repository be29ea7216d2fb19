/// URL slug generation for comic titles and author names.
///
/// Accented Latin letters are folded to ASCII, every run of other
/// non-alphanumeric characters collapses into a single dash, and the result
/// is lowercased with no leading or trailing dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        let folded = if ch.is_ascii_alphanumeric() {
            push_char(&mut slug, ch, &mut pending_dash);
            continue;
        } else {
            fold_latin(ch)
        };

        match folded {
            Some(ascii) => {
                for folded_ch in ascii.chars() {
                    push_char(&mut slug, folded_ch, &mut pending_dash);
                }
            }
            None => {
                if !slug.is_empty() {
                    pending_dash = true;
                }
            }
        }
    }

    slug
}

fn push_char(slug: &mut String, ch: char, pending_dash: &mut bool) {
    if *pending_dash {
        slug.push('-');
        *pending_dash = false;
    }
    slug.push(ch.to_ascii_lowercase());
}

/// ASCII folding for the accented Latin letters that show up in the catalog
/// (titles and author names are mostly French). Anything unmapped becomes a
/// separator.
fn fold_latin(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' | 'À' | 'Á' | 'Â' | 'Ä' | 'Ã' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ç' | 'Ç' => "c",
        'ñ' | 'Ñ' => "n",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_dashes_spaces() {
        assert_eq!(slugify("Watchmen Deluxe Edition"), "watchmen-deluxe-edition");
    }

    #[test]
    fn folds_accented_latin_letters() {
        assert_eq!(slugify("Astérix le Gaulois"), "asterix-le-gaulois");
        assert_eq!(slugify("Hergé"), "herge");
        assert_eq!(slugify("L'Œil du Dragon"), "l-oeil-du-dragon");
    }

    #[test]
    fn collapses_punctuation_runs_and_trims_edges() {
        assert_eq!(slugify("  --Tome 3 : La Marque!!  "), "tome-3-la-marque");
    }

    #[test]
    fn unmapped_symbols_become_separators() {
        assert_eq!(slugify("V★pour★Vendetta"), "v-pour-vendetta");
    }

    #[test]
    fn empty_and_symbol_only_inputs_give_empty_slugs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
