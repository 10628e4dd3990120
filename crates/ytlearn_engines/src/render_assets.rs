#![forbid(unsafe_code)]

// Static page templates. `{{NAME}}` marks an injection point filled by
// `render::fill_template`; everything else is emitted byte-for-byte.

pub(crate) const FONT_LINKS: &str = r#"<link rel="preconnect" href="https://fonts.googleapis.com">
<link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap" rel="stylesheet">"#;

pub(crate) const BASE_CSS: &str = r#"*,*::before,*::after{box-sizing:border-box}
body{margin:0;min-height:100vh;font-family:'Inter',system-ui,sans-serif;background:var(--bg);color:var(--text);line-height:1.5}
.app{max-width:960px;margin:0 auto;padding:24px 16px 48px}
.app-header{display:flex;flex-wrap:wrap;align-items:baseline;justify-content:space-between;gap:8px;margin-bottom:24px}
.app-header h1{margin:0;font-size:1.6rem}
.progress{margin:0;color:var(--muted);font-weight:600}
button{font:inherit;cursor:pointer;border:none;border-radius:var(--radius);padding:10px 18px;background:var(--accent);color:#fff;font-weight:600;transition:opacity .15s,transform .15s}
button:hover:not(:disabled){transform:translateY(-1px)}
button:disabled{opacity:.4;cursor:default}
.controls{display:flex;flex-wrap:wrap;justify-content:center;gap:12px;margin-top:24px}
[hidden]{display:none!important}"#;

pub(crate) const QUIZ_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
{{FONT_LINKS}}
<style>
:root{{{CSS_VARS}}}
{{BASE_CSS}}
.question{background:var(--surface);border-radius:var(--radius);padding:24px;box-shadow:0 8px 24px rgba(15,23,42,.08)}
.question-text{margin-top:0;font-size:1.25rem}
.options{list-style:none;margin:0;padding:0;display:grid;gap:10px}
.option{width:100%;text-align:left;background:var(--bg);color:var(--text);border:2px solid transparent}
.option.selected{border-color:var(--accent)}
.option.correct{background:var(--ok);color:#fff}
.option.wrong{background:var(--ko);color:#fff}
.explanation{margin-bottom:0;padding:12px;border-left:4px solid var(--accent);background:var(--accent-soft)}
.results{background:var(--surface);border-radius:var(--radius);padding:24px}
.results ol{padding-left:20px}
.review{margin-bottom:16px}
.review.ok .review-question{color:var(--ok)}
.review.ko .review-question{color:var(--ko)}
.review-question{font-weight:700;margin-bottom:4px}
.review p{margin:2px 0}
</style>
</head>
<body>
<main class="app">
<header class="app-header">
<h1>{{TITLE}}</h1>
<p class="progress" id="progress">Question 1 / {{COUNT}}</p>
</header>
<div id="questions">
{{QUESTIONS}}
</div>
<section id="results" class="results" hidden></section>
<nav class="controls">
<button id="prev" type="button">Précédent</button>
<button id="validate" type="button">Valider le quiz</button>
<button id="next" type="button">Suivant</button>
</nav>
</main>
<script type="application/json" id="quiz-data">{{DATA_JSON}}</script>
<script>
(function () {
  var data = JSON.parse(document.getElementById('quiz-data').textContent);
  var container = document.getElementById('questions');
  var blocks = Array.prototype.slice.call(container.querySelectorAll('.question'));
  var answers = blocks.map(function () { return null; });
  var current = 0;
  var validated = false;
  var prev = document.getElementById('prev');
  var next = document.getElementById('next');
  var validate = document.getElementById('validate');
  var progress = document.getElementById('progress');
  var results = document.getElementById('results');

  function paint(index) {
    var block = blocks[index];
    var correct = data.questions[index].reponseCorrecte;
    Array.prototype.forEach.call(block.querySelectorAll('.option'), function (btn) {
      var option = Number(btn.getAttribute('data-option'));
      btn.classList.toggle('selected', answers[index] === option);
      btn.classList.toggle('correct', validated && option === correct);
      btn.classList.toggle('wrong', validated && answers[index] === option && option !== correct);
      btn.disabled = validated;
    });
    block.querySelector('.explanation').hidden = !validated;
  }

  function show(index) {
    current = Math.max(0, Math.min(blocks.length - 1, index));
    container.hidden = false;
    results.hidden = true;
    blocks.forEach(function (block, i) { block.hidden = i !== current; });
    paint(current);
    prev.disabled = current === 0;
    next.disabled = current === blocks.length - 1;
    progress.textContent = 'Question ' + (current + 1) + ' / ' + blocks.length;
  }

  function score() {
    return data.questions.reduce(function (acc, q, i) {
      return acc + (answers[i] === q.reponseCorrecte ? 1 : 0);
    }, 0);
  }

  function line(text, className) {
    var p = document.createElement('p');
    if (className) { p.className = className; }
    p.textContent = text;
    return p;
  }

  function showResults() {
    validated = true;
    validate.textContent = 'Voir le score';
    results.innerHTML = '';
    var heading = document.createElement('h2');
    heading.textContent = 'Score : ' + score() + ' / ' + blocks.length;
    results.appendChild(heading);
    var list = document.createElement('ol');
    data.questions.forEach(function (q, i) {
      var item = document.createElement('li');
      item.className = answers[i] === q.reponseCorrecte ? 'review ok' : 'review ko';
      item.appendChild(line(q.question, 'review-question'));
      item.appendChild(line('Votre réponse : ' + (answers[i] === null ? 'aucune' : q.options[answers[i]])));
      item.appendChild(line('Bonne réponse : ' + q.options[q.reponseCorrecte]));
      if (q.explication) { item.appendChild(line(q.explication, 'review-explanation')); }
      var review = document.createElement('button');
      review.type = 'button';
      review.textContent = 'Revoir la question';
      review.addEventListener('click', function () { show(i); });
      item.appendChild(review);
      list.appendChild(item);
    });
    results.appendChild(list);
    var restart = document.createElement('button');
    restart.type = 'button';
    restart.textContent = 'Recommencer';
    restart.addEventListener('click', function () {
      validated = false;
      validate.textContent = 'Valider le quiz';
      answers = blocks.map(function () { return null; });
      show(0);
    });
    results.appendChild(restart);
    container.hidden = true;
    results.hidden = false;
    progress.textContent = 'Résultats';
  }

  blocks.forEach(function (block, index) {
    block.addEventListener('click', function (event) {
      var btn = event.target.closest('.option');
      if (!btn || validated) { return; }
      answers[index] = Number(btn.getAttribute('data-option'));
      paint(index);
    });
  });

  prev.addEventListener('click', function () { show(current - 1); });
  next.addEventListener('click', function () { show(current + 1); });
  validate.addEventListener('click', showResults);
  document.addEventListener('keydown', function (event) {
    if (event.key === 'ArrowLeft') { show(current - 1); }
    else if (event.key === 'ArrowRight') { show(current + 1); }
    else if (!validated && /^[1-9]$/.test(event.key)) {
      var option = Number(event.key) - 1;
      if (option < data.questions[current].options.length) {
        answers[current] = option;
        paint(current);
      }
    }
  });
  show(0);
})();
</script>
</body>
</html>
"#;

pub(crate) const FLASHCARDS_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
{{FONT_LINKS}}
<style>
:root{{{CSS_VARS}}}
{{BASE_CSS}}
.deck{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:16px}
.card{perspective:1000px;height:220px;cursor:pointer;outline:none}
.card:focus-visible .card-inner{box-shadow:0 0 0 3px var(--accent)}
.card-inner{position:relative;width:100%;height:100%;transition:transform .5s;transform-style:preserve-3d;border-radius:var(--radius)}
.card.flipped .card-inner{transform:rotateY(180deg)}
.card-face{position:absolute;inset:0;display:flex;align-items:center;justify-content:center;padding:20px;text-align:center;border-radius:var(--radius);backface-visibility:hidden;box-shadow:0 8px 24px rgba(15,23,42,.08);overflow:auto}
.card-front{background:var(--surface);font-weight:600}
.card-back{background:var(--accent);color:#fff;transform:rotateY(180deg)}
.hint{text-align:center;color:var(--muted);font-size:.9rem}
</style>
</head>
<body>
<main class="app">
<header class="app-header">
<h1>{{TITLE}}</h1>
<p class="progress" id="page-indicator">Page 1 / {{PAGES}}</p>
</header>
<div class="deck" id="deck" data-per-page="{{PER_PAGE}}">
{{CARDS}}
</div>
<nav class="controls">
<button id="prev" type="button">Page précédente</button>
<button id="flip-all" type="button">Tout retourner</button>
<button id="next" type="button">Page suivante</button>
</nav>
<p class="hint">Cliquez sur une carte pour la retourner. Clavier : ← → pour changer de page, F ou Espace pour tout retourner.</p>
</main>
<script>
(function () {
  var deck = document.getElementById('deck');
  var cards = Array.prototype.slice.call(deck.querySelectorAll('.card'));
  var perPage = Number(deck.getAttribute('data-per-page')) || 4;
  var pages = Math.max(1, Math.ceil(cards.length / perPage));
  var page = 0;
  var prev = document.getElementById('prev');
  var next = document.getElementById('next');
  var indicator = document.getElementById('page-indicator');

  function onPage(card) { return Number(card.getAttribute('data-page')) === page; }

  function render() {
    cards.forEach(function (card) { card.hidden = !onPage(card); });
    indicator.textContent = 'Page ' + (page + 1) + ' / ' + pages;
    prev.disabled = page === 0;
    next.disabled = page === pages - 1;
  }

  function go(target) {
    if (target < 0 || target >= pages) { return; }
    page = target;
    render();
  }

  function flipAll() {
    var visible = cards.filter(onPage);
    var anyFront = visible.some(function (card) { return !card.classList.contains('flipped'); });
    visible.forEach(function (card) { card.classList.toggle('flipped', anyFront); });
  }

  cards.forEach(function (card) {
    card.addEventListener('click', function () { card.classList.toggle('flipped'); });
    card.addEventListener('keydown', function (event) {
      if (event.key === 'Enter') { card.classList.toggle('flipped'); }
    });
  });
  prev.addEventListener('click', function () { go(page - 1); });
  next.addEventListener('click', function () { go(page + 1); });
  document.getElementById('flip-all').addEventListener('click', flipAll);
  document.addEventListener('keydown', function (event) {
    if (event.key === 'ArrowLeft') { go(page - 1); }
    else if (event.key === 'ArrowRight') { go(page + 1); }
    else if (event.key === 'f' || event.key === 'F' || event.key === ' ') {
      event.preventDefault();
      flipAll();
    }
  });
  render();
})();
</script>
</body>
</html>
"#;

pub(crate) const ERROR_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Contenu indisponible</title>
{{FONT_LINKS}}
<style>
:root{{{CSS_VARS}}}
{{BASE_CSS}}
.error-box{margin-top:15vh;background:var(--surface);border-radius:var(--radius);border-top:6px solid var(--accent);padding:32px;text-align:center;box-shadow:0 8px 24px rgba(15,23,42,.08)}
.error-box h1{margin-top:0}
</style>
</head>
<body>
<main class="app">
<div class="error-box" role="alert">
<h1>Contenu indisponible</h1>
<p id="error-message">{{MESSAGE}}</p>
</div>
</main>
</body>
</html>
"#;
