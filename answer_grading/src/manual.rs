/*!

This is the long-form manual for `answer_grading` and `mcgrade`.

## Input tables

All tables are read by column position. The names in the header row are not significant.
Both CSV (`csv`) and Excel (`xlsx`) files are accepted. CSV files may be encoded in UTF-8
(with or without a byte order mark) or in CP949.

### Student answers, `standard` layout

```text
student id,subject code,1,2,3,...
2024001,MATH01,1,3,2
2024002,ENG01,4,1,3
```

The first column identifies the student, the second one selects the answer key.
Every following column is the answer to the next question. Blank cells are graded wrong.

### Student answers, `tamgu` layout

```text
student id,subject 1,subject 2,1,...,20,21,...,40
2024001,11,20,3,...,1,4,...,2
```

Each line holds two subjects of 20 questions. Answers 1 to 20 belong to the first subject,
answers 21 to 40 to the second one, where they are graded as questions 1 to 20.
The table needs at least 43 columns. By default, a line with fewer than 40 answers fails the
whole file; the `skip` policy drops such lines instead and reports them.

### Answer key

```text
subject,question,answer,points
MATH01,1,1,5
MATH01,2,3,5
ENG01,1,4,10
```

Lines can come in any order: they are grouped by subject and sorted by question number.
Points that are not a non-negative number count as 0 and are reported, in the order of the
lines. A line that stops after the question number has a blank answer and blank points.
A question number that appears twice for the same subject is an error.

### Roster (optional)

```text
student number,phone,name
2024001,01055551234,Kim
```

A student identifier is matched against the roster, first match wins:
1. it equals the student number followed by the phone number,
2. it starts with a student number,
3. it ends with a phone number.

When several roster lines could match at stages 2 or 3, the earliest line wins.
Lines with neither student number nor name are ignored; lines with only one of them are
skipped and reported.

## Answer comparison

Both answers are trimmed. A blank answer, or `NaN`, is always wrong. If both read as numbers,
they are compared as numbers, so `1`, `1.0` and `01` are the same answer. Otherwise the
comparison is exact and case-sensitive.

## Scores

The score is the sum of the points of the correct answers and the maximum score the sum
of all the points of the subject. Both are truncated to integers, not rounded:
9.5 points is a score of 9.

## Configuration

`mcgrade` can run from command-line flags only, or from a JSON configuration file:

```json
{
  "outputSettings": { "examName": "Midterm", "resultsCsv": "results.csv" },
  "studentFileSources": [
    { "provider": "csv", "filePath": "answers.csv", "layout": "standard" }
  ],
  "answerKeySource": { "provider": "csv", "filePath": "key.csv" },
  "rosterSource": { "provider": "xlsx", "filePath": "roster.xlsx", "excelWorksheetName": "Sheet1" },
  "subjectNames": { "MATH01": "Mathematics" },
  "rules": { "incompleteTamguPolicy": "abort", "topWrongQuestions": 10 }
}
```

File paths are relative to the configuration file. Options of `FileSource`:
 - `provider` (`csv` or `xlsx`)
 - `filePath`
 - `layout` (`standard` or `tamgu`, student files only, default `standard`)
 - `hasHeader` (default `true`)
 - `excelWorksheetName` (default: the first worksheet)

 */
