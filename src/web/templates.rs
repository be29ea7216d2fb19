use chrono::{Datelike, Utc};

use crate::{
    api::{Author, AuthorsPage, Comic, ComicsPage},
    web::{flash::Flash, session::TimeLeft},
};

const BASE_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; min-height: 100vh; display: flex; flex-direction: column; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; }
        .header-bar { display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; max-width: 1100px; margin: 0 auto; }
        .header-bar h1 { margin: 0; font-size: 1.6rem; }
        nav { display: flex; gap: 0.75rem; flex-wrap: wrap; align-items: center; }
        nav a { color: #1d4ed8; text-decoration: none; font-weight: 600; background: #e0f2fe; padding: 0.45rem 0.9rem; border-radius: 999px; border: 1px solid #bfdbfe; }
        nav a:hover { background: #bfdbfe; }
        nav a.admin { background: #fee2e2; border-color: #fecaca; color: #0f172a; }
        main { flex: 1; padding: 2rem 1.5rem; max-width: 1100px; margin: 0 auto; width: 100%; box-sizing: border-box; }
        .flash { padding: 1rem 1.25rem; border-radius: 10px; margin-bottom: 1rem; font-weight: 600; border: 1px solid transparent; }
        .flash.success { background: #ecfdf3; border-color: #bbf7d0; color: #166534; }
        .flash.danger { background: #fef2f2; border-color: #fecaca; color: #b91c1c; }
        .session-banner { background: #eef2ff; border: 1px solid #c7d2fe; color: #3730a3; padding: 0.6rem 1rem; border-radius: 10px; margin-bottom: 1.5rem; font-size: 0.9rem; }
        .panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.08); margin-bottom: 2rem; }
        .panel h2 { margin-top: 0; }
        table { width: 100%; border-collapse: collapse; background: #ffffff; border: 1px solid #e2e8f0; border-radius: 12px; overflow: hidden; }
        th, td { padding: 0.75rem 1rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
        th { background: #f1f5f9; font-weight: 600; }
        td a { color: #2563eb; text-decoration: none; font-weight: 600; }
        td a:hover { text-decoration: underline; }
        label { display: block; margin-top: 1.1rem; font-weight: 600; }
        input, select, textarea { width: 100%; padding: 0.75rem; margin-top: 0.5rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; box-sizing: border-box; font-size: 1rem; }
        button { margin-top: 1.6rem; padding: 0.85rem 1.2rem; border: none; border-radius: 8px; background: #2563eb; color: #ffffff; font-weight: 600; cursor: pointer; }
        button:hover { background: #1d4ed8; }
        .pagination { display: flex; gap: 0.5rem; margin-top: 1.5rem; flex-wrap: wrap; }
        .pagination a, .pagination span { padding: 0.45rem 0.85rem; border-radius: 8px; border: 1px solid #cbd5f5; text-decoration: none; color: #1d4ed8; font-weight: 600; }
        .pagination span.current { background: #2563eb; border-color: #2563eb; color: #ffffff; }
        .app-footer { margin-top: 2.5rem; padding-bottom: 1.5rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_footer() -> String {
    let current_year = Utc::now().year();
    format!(r#"<footer class="app-footer">© {current_year} Comics Collection</footer>"#)
}

pub fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="flash {class}">{message}</div>"#,
                class = flash.level.css_class(),
                message = escape_html(&flash.message),
            )
        })
        .collect()
}

/// "Session expires in H:M:S" banner shown on every admin page.
pub fn render_session_banner(time_left: &TimeLeft) -> String {
    format!(
        r#"<div class="session-banner">Session expires in {hours}h {minutes}m {seconds}s</div>"#,
        hours = time_left.hours_left,
        minutes = time_left.minutes_left,
        seconds = time_left.seconds_left,
    )
}

fn public_nav() -> &'static str {
    r#"<nav>
                <a href="/">Home</a>
                <a href="/comics">Comics</a>
                <a href="/authors">Authors</a>
                <a class="admin" href="/admin">Admin</a>
            </nav>"#
}

fn admin_nav() -> &'static str {
    r#"<nav>
                <a href="/admin">Dashboard</a>
                <a href="/admin/comics">Comics</a>
                <a href="/admin/authors">Authors</a>
                <a href="/">Public site</a>
                <form class="logout-form" method="post" action="/logout" style="margin:0;"><button type="submit" style="margin:0;">Sign out</button></form>
            </nav>"#
}

fn page_shell(meta_title: &str, heading: &str, nav: &str, main_html: &str) -> String {
    let footer = render_footer();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{meta_title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{BASE_STYLES}
    </style>
</head>
<body>
    <header>
        <div class="header-bar">
            <h1>{heading}</h1>
            {nav}
        </div>
    </header>
    <main>
{main_html}
    </main>
    {footer}
</body>
</html>"#,
        meta_title = escape_html(meta_title),
        heading = escape_html(heading),
    )
}

fn pagination(base_path: &str, current_page: u32, total_pages: u32) -> String {
    if total_pages <= 1 {
        return String::new();
    }
    let links = (1..=total_pages)
        .map(|page| {
            if page == current_page {
                format!(r#"<span class="current">{page}</span>"#)
            } else {
                format!(r#"<a href="{base_path}?page={page}">{page}</a>"#)
            }
        })
        .collect::<String>();
    format!(r#"<div class="pagination">{links}</div>"#)
}

fn comics_table(comics: &[Comic], detail_base: &str) -> String {
    let rows = comics
        .iter()
        .map(|comic| {
            format!(
                r#"<tr><td><a href="{base}/{slug}">{title}</a></td><td>{collection}</td><td>{tome}</td></tr>"#,
                base = detail_base,
                slug = escape_html(&comic.slug),
                title = escape_html(&comic.title),
                collection = escape_html(comic.collection.as_deref().unwrap_or("—")),
                tome = comic
                    .tome
                    .map(|tome| tome.to_string())
                    .unwrap_or_else(|| "—".to_string()),
            )
        })
        .collect::<String>();
    format!(
        r#"<table>
            <tr><th>Title</th><th>Collection</th><th>Tome</th></tr>
            {rows}
        </table>"#
    )
}

fn authors_table(authors: &[Author], detail_base: Option<&str>) -> String {
    let rows = authors
        .iter()
        .map(|author| {
            let name_cell = match detail_base {
                Some(base) => format!(
                    r#"<a href="{base}/{slug}">{name}</a>"#,
                    slug = escape_html(&author.slug),
                    name = escape_html(&author.name),
                ),
                None => escape_html(&author.name),
            };
            format!(
                r#"<tr><td>{name_cell}</td><td>{birthdate}</td><td>{website}</td></tr>"#,
                birthdate = escape_html(author.birthdate.as_deref().unwrap_or("—")),
                website = escape_html(author.website.as_deref().unwrap_or("—")),
            )
        })
        .collect::<String>();
    format!(
        r#"<table>
            <tr><th>Name</th><th>Born</th><th>Website</th></tr>
            {rows}
        </table>"#
    )
}

fn comic_details(comic: &Comic) -> String {
    let cover = comic
        .front_cover
        .as_deref()
        .map(|url| {
            format!(
                r#"<p><img src="{url}" alt="Front cover" style="max-width: 240px; border-radius: 8px;"></p>"#,
                url = escape_html(url),
            )
        })
        .unwrap_or_default();
    format!(
        r#"<section class="panel">
            <h2>{title}</h2>
            {cover}
            <p><strong>Collection:</strong> {collection}</p>
            <p><strong>Tome:</strong> {tome}</p>
            <p>{description}</p>
        </section>"#,
        title = escape_html(&comic.title),
        collection = escape_html(comic.collection.as_deref().unwrap_or("—")),
        tome = comic
            .tome
            .map(|tome| tome.to_string())
            .unwrap_or_else(|| "—".to_string()),
        description = escape_html(comic.description.as_deref().unwrap_or("")),
    )
}

pub fn render_home(comics: &[Comic], authors: &[Author], flashes: &[Flash]) -> String {
    let main_html = format!(
        r#"{flashes}
        <section class="panel">
            <h2>Latest comics</h2>
            {comics}
        </section>
        <section class="panel">
            <h2>Authors</h2>
            {authors}
        </section>"#,
        flashes = render_flashes(flashes),
        comics = comics_table(comics, "/comics"),
        authors = authors_table(authors, Some("/authors")),
    );
    page_shell("Comics Collection", "Comics Collection", public_nav(), &main_html)
}

pub fn render_error_page(message: &str) -> String {
    let main_html = format!(
        r#"<section class="panel">
            <h2>Something went wrong</h2>
            <p>{message}</p>
        </section>"#,
        message = escape_html(message),
    );
    page_shell("Comics Collection — error", "Comics Collection", public_nav(), &main_html)
}

pub fn render_comics_index(page: &ComicsPage, current_page: u32, flashes: &[Flash]) -> String {
    let main_html = format!(
        r#"{flashes}
        <section class="panel">
            <h2>Comics</h2>
            {table}
            {pagination}
        </section>"#,
        flashes = render_flashes(flashes),
        table = comics_table(&page.comics, "/comics"),
        pagination = pagination("/comics", current_page, page.pages),
    );
    page_shell("Comics", "Comics Collection", public_nav(), &main_html)
}

pub fn render_comic_show(comic: &Comic, flashes: &[Flash]) -> String {
    let main_html = format!(
        "{}{}",
        render_flashes(flashes),
        comic_details(comic),
    );
    page_shell(&comic.title, "Comics Collection", public_nav(), &main_html)
}

pub fn render_authors_index(page: &AuthorsPage, current_page: u32, flashes: &[Flash]) -> String {
    let main_html = format!(
        r#"{flashes}
        <section class="panel">
            <h2>Authors</h2>
            {table}
            {pagination}
        </section>"#,
        flashes = render_flashes(flashes),
        table = authors_table(&page.authors, Some("/authors")),
        pagination = pagination("/authors", current_page, page.pages),
    );
    page_shell("Authors", "Comics Collection", public_nav(), &main_html)
}

pub fn render_author_show(author: &Author, flashes: &[Flash]) -> String {
    let portrait = author
        .image
        .as_deref()
        .map(|url| {
            format!(
                r#"<p><img src="{url}" alt="Portrait" style="max-width: 200px; border-radius: 8px;"></p>"#,
                url = escape_html(url),
            )
        })
        .unwrap_or_default();
    let website = author
        .website
        .as_deref()
        .map(|url| {
            format!(
                r#"<p><a href="{url}">{url}</a></p>"#,
                url = escape_html(url),
            )
        })
        .unwrap_or_default();
    let main_html = format!(
        r#"{flashes}
        <section class="panel">
            <h2>{name}</h2>
            {portrait}
            <p><strong>Born:</strong> {birthdate}</p>
            <p>{bio}</p>
            {website}
        </section>"#,
        flashes = render_flashes(flashes),
        name = escape_html(&author.name),
        birthdate = escape_html(author.birthdate.as_deref().unwrap_or("—")),
        bio = escape_html(author.bio.as_deref().unwrap_or("")),
    );
    page_shell(&author.name, "Comics Collection", public_nav(), &main_html)
}

pub fn render_login_page(flashes: &[Flash], last_email: &str) -> String {
    let main_html = format!(
        r#"{flashes}
        <section class="panel" style="max-width: 480px; margin: 0 auto;">
            <h2>Sign in</h2>
            <form method="post" action="/login_check">
                <label for="email">Email</label>
                <input id="email" name="email" type="email" value="{last_email}" required autofocus>
                <label for="password">Password</label>
                <input id="password" name="password" type="password" required>
                <button type="submit">Sign in</button>
            </form>
        </section>"#,
        flashes = render_flashes(flashes),
        last_email = escape_html(last_email),
    );
    page_shell("Sign in", "Comics Collection", public_nav(), &main_html)
}

pub fn render_admin_dashboard(
    token_present: bool,
    time_left: &TimeLeft,
    flashes: &[Flash],
) -> String {
    let token_line = if token_present {
        "A backend API token is stored in your session."
    } else {
        "No backend API token is stored."
    };
    let main_html = format!(
        r#"{flashes}
        {banner}
        <section class="panel">
            <h2>Administration</h2>
            <p>{token_line}</p>
            <p><a href="/admin/comics">Manage comics</a> · <a href="/admin/authors">Manage authors</a></p>
        </section>"#,
        flashes = render_flashes(flashes),
        banner = render_session_banner(time_left),
    );
    page_shell("Administration", "Comics Collection — admin", admin_nav(), &main_html)
}

pub fn render_admin_comics(
    page: &ComicsPage,
    current_page: u32,
    time_left: &TimeLeft,
    flashes: &[Flash],
) -> String {
    let main_html = format!(
        r#"{flashes}
        {banner}
        <section class="panel">
            <h2>Comics</h2>
            <p><a href="/admin/comics/new">Add a comic</a></p>
            {table}
            {pagination}
        </section>"#,
        flashes = render_flashes(flashes),
        banner = render_session_banner(time_left),
        table = comics_table(&page.comics, "/admin/comics"),
        pagination = pagination("/admin/comics", current_page, page.pages),
    );
    page_shell("Comics — admin", "Comics Collection — admin", admin_nav(), &main_html)
}

pub fn render_admin_comic_show(comic: &Comic, time_left: &TimeLeft, flashes: &[Flash]) -> String {
    let main_html = format!(
        "{}{}{}",
        render_flashes(flashes),
        render_session_banner(time_left),
        comic_details(comic),
    );
    page_shell(&comic.title, "Comics Collection — admin", admin_nav(), &main_html)
}

pub fn render_comic_form(authors: &[Author], time_left: &TimeLeft, flashes: &[Flash]) -> String {
    let options = authors
        .iter()
        .map(|author| {
            format!(
                r#"<option value="{id}">{name}</option>"#,
                id = author.id.unwrap_or_default(),
                name = escape_html(&author.name),
            )
        })
        .collect::<String>();
    let main_html = format!(
        r#"{flashes}
        {banner}
        <section class="panel">
            <h2>Add a comic</h2>
            <form method="post" action="/admin/comics" enctype="multipart/form-data">
                <label for="title">Title</label>
                <input id="title" name="title" type="text" required>
                <label for="collection">Collection</label>
                <input id="collection" name="collection" type="text">
                <label for="tome">Tome</label>
                <input id="tome" name="tome" type="number" min="1">
                <label for="description">Description</label>
                <textarea id="description" name="description" rows="5"></textarea>
                <label for="authorId">Author</label>
                <select id="authorId" name="authorId">{options}</select>
                <label for="frontCover">Front cover (jpg, jpeg or png)</label>
                <input id="frontCover" name="frontCover" type="file" accept=".jpg,.jpeg,.png">
                <button type="submit">Add comic</button>
            </form>
        </section>"#,
        flashes = render_flashes(flashes),
        banner = render_session_banner(time_left),
    );
    page_shell("Add a comic", "Comics Collection — admin", admin_nav(), &main_html)
}

pub fn render_admin_authors(
    page: &AuthorsPage,
    time_left: &TimeLeft,
    flashes: &[Flash],
) -> String {
    let main_html = format!(
        r#"{flashes}
        {banner}
        <section class="panel">
            <h2>Authors</h2>
            <p><a href="/admin/authors/new">Add an author</a></p>
            {table}
        </section>"#,
        flashes = render_flashes(flashes),
        banner = render_session_banner(time_left),
        table = authors_table(&page.authors, None),
    );
    page_shell("Authors — admin", "Comics Collection — admin", admin_nav(), &main_html)
}

pub fn render_author_form(time_left: &TimeLeft, flashes: &[Flash]) -> String {
    let main_html = format!(
        r#"{flashes}
        {banner}
        <section class="panel">
            <h2>Add an author</h2>
            <form method="post" action="/admin/authors" enctype="multipart/form-data">
                <label for="firstname">First name</label>
                <input id="firstname" name="firstname" type="text" required>
                <label for="lastname">Last name</label>
                <input id="lastname" name="lastname" type="text" required>
                <label for="birthdate">Birthdate</label>
                <input id="birthdate" name="birthdate" type="date">
                <label for="website">Website</label>
                <input id="website" name="website" type="url">
                <label for="biography">Biography</label>
                <textarea id="biography" name="biography" rows="5"></textarea>
                <label for="profileImage">Portrait (jpg, jpeg or png)</label>
                <input id="profileImage" name="profileImage" type="file" accept=".jpg,.jpeg,.png">
                <button type="submit">Add author</button>
            </form>
        </section>"#,
        flashes = render_flashes(flashes),
        banner = render_session_banner(time_left),
    );
    page_shell("Add an author", "Comics Collection — admin", admin_nav(), &main_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<img src="x" onerror='y'> & more"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;y&#39;&gt; &amp; more"
        );
    }

    #[test]
    fn session_banner_shows_all_three_components() {
        let banner = render_session_banner(&TimeLeft {
            hours_left: 2,
            minutes_left: 30,
            seconds_left: 15,
        });
        assert!(banner.contains("2h 30m 15s"));
    }

    #[test]
    fn pagination_marks_the_current_page() {
        let html = pagination("/comics", 2, 3);
        assert!(html.contains(r#"<span class="current">2</span>"#));
        assert!(html.contains(r#"href="/comics?page=1""#));
        assert!(html.contains(r#"href="/comics?page=3""#));
    }

    #[test]
    fn pagination_is_empty_for_a_single_page() {
        assert!(pagination("/comics", 1, 1).is_empty());
    }

    #[test]
    fn comic_titles_are_escaped_in_tables() {
        let comics = vec![Comic {
            title: "<script>alert(1)</script>".to_string(),
            slug: "xss".to_string(),
            collection: None,
            tome: None,
            description: None,
            author_id: None,
            front_cover: None,
        }];
        let html = comics_table(&comics, "/comics");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
